use super::bounded;
use crate::domain::post::{AuthorProfile, LikeResponse, NewPost, PopulatedPost, PostChanges};
use crate::domain::{DomainError, Post};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::time::Duration;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, author_id: i64, post: NewPost) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError>;
    async fn find_populated(&self, id: i64) -> Result<PopulatedPost, DomainError>;
    /// Every post, newest first. Unbounded.
    async fn list_populated(&self) -> Result<Vec<PopulatedPost>, DomainError>;
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    /// Adds `user_id` to the like set if absent, removes it otherwise, as one
    /// atomic step.
    async fn toggle_like(&self, id: i64, user_id: i64) -> Result<LikeResponse, DomainError>;
}

pub struct PostgresPostRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        image: row.try_get("image")?,
        author_id: row.try_get("author_id")?,
        likes: row.try_get("likes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn populated_from_row(row: &PgRow) -> Result<PopulatedPost, DomainError> {
    let post = post_from_row(row)?;
    let author = AuthorProfile {
        id: post.author_id,
        name: row.try_get("author_name")?,
        email: row.try_get("author_email")?,
    };
    Ok(PopulatedPost { post, author })
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, author_id: i64, post: NewPost) -> Result<Post, DomainError> {
        let row = bounded(
            self.timeout,
            "posts.create",
            sqlx::query(
                r#"
                INSERT INTO posts (title, body, image, author_id, likes, created_at, updated_at)
                VALUES ($1, $2, $3, $4, '{}', NOW(), NOW())
                RETURNING id, title, body, image, author_id, likes, created_at, updated_at
                "#,
            )
            .bind(&post.title)
            .bind(&post.body)
            .bind(&post.image)
            .bind(author_id)
            .fetch_one(&self.pool),
        )
        .await?;

        post_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let row = bounded(
            self.timeout,
            "posts.find_by_id",
            sqlx::query(
                r#"
                SELECT id, title, body, image, author_id, likes, created_at, updated_at
                FROM posts
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn find_populated(&self, id: i64) -> Result<PopulatedPost, DomainError> {
        let row = bounded(
            self.timeout,
            "posts.find_populated",
            sqlx::query(
                r#"
                SELECT p.id, p.title, p.body, p.image, p.author_id, p.likes,
                       p.created_at, p.updated_at,
                       u.name AS author_name, u.email AS author_email
                FROM posts p
                JOIN users u ON u.id = p.author_id
                WHERE p.id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => populated_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn list_populated(&self) -> Result<Vec<PopulatedPost>, DomainError> {
        let rows = bounded(
            self.timeout,
            "posts.list_populated",
            sqlx::query(
                r#"
                SELECT p.id, p.title, p.body, p.image, p.author_id, p.likes,
                       p.created_at, p.updated_at,
                       u.name AS author_name, u.email AS author_email
                FROM posts p
                JOIN users u ON u.id = p.author_id
                ORDER BY p.created_at DESC, p.id DESC
                "#,
            )
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter()
            .map(populated_from_row)
            .collect::<Result<Vec<PopulatedPost>, DomainError>>()
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError> {
        let row = bounded(
            self.timeout,
            "posts.update",
            sqlx::query(
                r#"
                UPDATE posts
                SET
                    title = COALESCE($1, title),
                    body = COALESCE($2, body),
                    image = COALESCE($3, image),
                    updated_at = NOW()
                WHERE id = $4
                RETURNING id, title, body, image, author_id, likes, created_at, updated_at
                "#,
            )
            .bind(changes.title)
            .bind(changes.body)
            .bind(changes.image)
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = bounded(
            self.timeout,
            "posts.delete",
            sqlx::query(
                r#"
                DELETE FROM posts
                WHERE id = $1
                "#,
            )
            .bind(id)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn toggle_like(&self, id: i64, user_id: i64) -> Result<LikeResponse, DomainError> {
        // Single UPDATE: the row lock serialises concurrent togglers and the
        // CASE is re-evaluated against the latest row version.
        let row = bounded(
            self.timeout,
            "posts.toggle_like",
            sqlx::query(
                r#"
                UPDATE posts
                SET likes = CASE
                    WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
                    ELSE array_append(likes, $2)
                END
                WHERE id = $1
                RETURNING cardinality(likes)::BIGINT AS likes_count, $2 = ANY(likes) AS liked
                "#,
            )
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => Ok(LikeResponse {
                likes_count: row.try_get("likes_count")?,
                liked: row.try_get("liked")?,
            }),
            None => Err(DomainError::PostNotFound),
        }
    }
}
