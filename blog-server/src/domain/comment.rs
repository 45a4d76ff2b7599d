use super::post::{AuthorProfile, AuthorResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PopulatedComment {
    pub comment: Comment,
    pub author: AuthorProfile,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub post: i64,
    pub author: AuthorResponse,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post: comment.post_id,
            author: AuthorResponse::id_only(comment.author_id),
            text: comment.text,
            created_at: comment.created_at,
        }
    }
}

impl From<PopulatedComment> for CommentResponse {
    fn from(populated: PopulatedComment) -> Self {
        let mut response = Self::from(populated.comment);
        response.author = AuthorResponse::name_only(populated.author);
        response
    }
}
