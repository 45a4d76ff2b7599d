use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{CommentResponse, CreateCommentRequest};
use crate::domain::post::require_text;
use crate::domain::DomainError;
use std::sync::Arc;

pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository + Send + Sync>,
    post_repo: Arc<dyn PostRepository + Send + Sync>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository + Send + Sync>,
        post_repo: Arc<dyn PostRepository + Send + Sync>,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
        }
    }

    pub async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        req: CreateCommentRequest,
    ) -> Result<CommentResponse, DomainError> {
        let text = require_text("text", req.text)?;

        // Comments may only hang off an existing post
        self.post_repo.find_by_id(post_id).await?;

        let comment = self.comment_repo.create(post_id, author_id, text).await?;

        tracing::info!(
            "Comment created: id={}, post_id={}, author_id={}",
            comment.id,
            post_id,
            author_id
        );

        Ok(CommentResponse::from(comment))
    }

    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentResponse>, DomainError> {
        let comments = self.comment_repo.list_by_post(post_id).await?;
        Ok(comments.into_iter().map(CommentResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::BlogService;
    use crate::data::memory::MemoryStore;
    use crate::domain::post::CreatePostRequest;

    struct Fixture {
        store: Arc<MemoryStore>,
        blog: BlogService,
        comments: CommentService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        Fixture {
            blog: BlogService::new(store.clone(), store.clone()),
            comments: CommentService::new(store.clone(), store.clone()),
            store,
        }
    }

    fn text(t: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            text: Some(t.to_string()),
        }
    }

    async fn post_by(f: &Fixture, author: i64) -> i64 {
        f.blog
            .create_post(
                author,
                CreatePostRequest {
                    title: Some("A".into()),
                    body: Some("B".into()),
                    image: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn comments_are_listed_in_creation_order_with_author_name() {
        let f = fixture();
        let ann = f.store.add_user("Ann", "ann@example.com");
        let bob = f.store.add_user("Bob", "bob@example.com");
        let post_id = post_by(&f, ann).await;

        let first = f.comments.add_comment(post_id, bob, text("first")).await.unwrap();
        assert_eq!(first.post, post_id);
        assert_eq!(first.author.id, bob);
        f.comments.add_comment(post_id, ann, text("second")).await.unwrap();

        let listed = f.comments.list_comments(post_id).await.unwrap();
        let texts: Vec<&str> = listed.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(listed[0].author.name.as_deref(), Some("Bob"));
        assert_eq!(listed[0].author.email, None);
    }

    #[tokio::test]
    async fn comments_are_scoped_to_their_post() {
        let f = fixture();
        let ann = f.store.add_user("Ann", "ann@example.com");
        let one = post_by(&f, ann).await;
        let two = post_by(&f, ann).await;

        f.comments.add_comment(one, ann, text("on one")).await.unwrap();

        assert_eq!(f.comments.list_comments(one).await.unwrap().len(), 1);
        assert!(f.comments.list_comments(two).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let f = fixture();
        let ann = f.store.add_user("Ann", "ann@example.com");

        let result = f.comments.add_comment(404, ann, text("hello")).await;

        assert!(matches!(result, Err(DomainError::PostNotFound)));
        assert_eq!(f.store.comment_count(), 0);
    }

    #[tokio::test]
    async fn blank_comment_is_rejected() {
        let f = fixture();
        let ann = f.store.add_user("Ann", "ann@example.com");
        let post_id = post_by(&f, ann).await;

        let blank = f.comments.add_comment(post_id, ann, text(" ")).await;
        assert!(matches!(blank, Err(DomainError::ValidationError(_))));

        let missing = f
            .comments
            .add_comment(post_id, ann, CreateCommentRequest { text: None })
            .await;
        assert!(matches!(missing, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn deleting_a_post_leaves_its_comments_in_place() {
        let f = fixture();
        let ann = f.store.add_user("Ann", "ann@example.com");
        let post_id = post_by(&f, ann).await;
        f.comments.add_comment(post_id, ann, text("bye")).await.unwrap();

        f.blog.delete_post(post_id, ann).await.unwrap();

        assert!(f.store.post(post_id).is_none());
        assert_eq!(f.store.comment_count(), 1);
        let listed = f.comments.list_comments(post_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "bye");
    }

    #[tokio::test]
    async fn insert_for_a_post_deleted_after_the_check_is_not_found() {
        let f = fixture();
        let ann = f.store.add_user("Ann", "ann@example.com");
        let post_id = post_by(&f, ann).await;
        f.blog.delete_post(post_id, ann).await.unwrap();

        // Straight to the repository, as if the delete landed between the
        // service's existence check and the insert
        let result = CommentRepository::create(&*f.store, post_id, ann, "late".into()).await;

        assert!(matches!(result, Err(DomainError::PostNotFound)));
        assert_eq!(f.store.comment_count(), 0);
    }
}
