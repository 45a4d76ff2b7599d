pub mod comment;
pub mod error;
pub mod post;
pub mod user;

pub use comment::Comment;
pub use error::DomainError;
pub use post::Post;
pub use user::User;
