//! Connection helpers for the repository tests that run against a real
//! PostgreSQL. Those tests are `#[ignore]`d and run with
//! `DATABASE_URL=... cargo test -- --ignored`.

use crate::infrastructure::database::run_migrations;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Migrated pool for `DATABASE_URL`. Tests share the database, so each one
/// creates its own users and posts and only asserts on those.
pub async fn pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for --ignored tests");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(TIMEOUT)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    run_migrations(&pool).await.expect("migrations");
    pool
}

/// Inserts a user with a unique email and returns its id.
pub async fn user(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO users (name, email, password_hash)
        VALUES ($1, $2, 'not-a-hash')
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple()))
    .fetch_one(pool)
    .await
    .expect("insert user")
}
