use super::bounded;
use crate::domain::user::NewUser;
use crate::domain::{DomainError, User};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::time::Duration;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(
        &self,
        user: NewUser,
        password_hash: String,
    ) -> Result<User, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<User, DomainError>;
}

pub struct PostgresUserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, DomainError> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(
        &self,
        user: NewUser,
        password_hash: String,
    ) -> Result<User, DomainError> {
        let insert = async {
            sqlx::query(
                r#"
                INSERT INTO users (name, email, password_hash, created_at)
                VALUES ($1, $2, $3, NOW())
                RETURNING id, name, email, password_hash, created_at
                "#,
            )
            .bind(&user.name)
            .bind(&user.email)
            .bind(&password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => DomainError::UserAlreadyExists,
                _ => DomainError::from(e),
            })
        };

        let row = bounded(self.timeout, "users.create", insert).await?;

        user_from_row(&row)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, DomainError> {
        let row = bounded(
            self.timeout,
            "users.find_by_email",
            sqlx::query(
                r#"
                SELECT id, name, email, password_hash, created_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(DomainError::UserNotFound),
        }
    }
}
