use super::bounded;
use crate::domain::comment::PopulatedComment;
use crate::domain::post::AuthorProfile;
use crate::domain::{Comment, DomainError};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::time::Duration;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, post_id: i64, author_id: i64, text: String)
        -> Result<Comment, DomainError>;
    async fn list_by_post(&self, post_id: i64) -> Result<Vec<PopulatedComment>, DomainError>;
}

pub struct PostgresCommentRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

fn comment_from_row(row: &PgRow) -> Result<Comment, DomainError> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        author_id: row.try_get("author_id")?,
        text: row.try_get("text")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Comment, DomainError> {
        // Inserts nothing if the post is gone, even when it was deleted after
        // the caller last saw it.
        let row = bounded(
            self.timeout,
            "comments.create",
            sqlx::query(
                r#"
                INSERT INTO comments (post_id, author_id, text, created_at)
                SELECT $1, $2, $3, NOW()
                WHERE EXISTS (SELECT 1 FROM posts WHERE id = $1)
                RETURNING id, post_id, author_id, text, created_at
                "#,
            )
            .bind(post_id)
            .bind(author_id)
            .bind(&text)
            .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => comment_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<PopulatedComment>, DomainError> {
        let rows = bounded(
            self.timeout,
            "comments.list_by_post",
            sqlx::query(
                r#"
                SELECT c.id, c.post_id, c.author_id, c.text, c.created_at,
                       u.name AS author_name, u.email AS author_email
                FROM comments c
                JOIN users u ON u.id = c.author_id
                WHERE c.post_id = $1
                ORDER BY c.created_at ASC, c.id ASC
                "#,
            )
            .bind(post_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter()
            .map(|row| {
                let comment = comment_from_row(row)?;
                let author = AuthorProfile {
                    id: comment.author_id,
                    name: row.try_get("author_name")?,
                    email: row.try_get("author_email")?,
                };
                Ok(PopulatedComment { comment, author })
            })
            .collect::<Result<Vec<PopulatedComment>, DomainError>>()
    }
}
