pub mod error;
pub mod http_client;
pub mod models;

use error::BlogClientError;
use models::{AuthResponse, Comment, LikeResponse, LoginRequest, Post, RegisterRequest};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Blog API client over HTTP. Cloning is cheap and clones share the token.
#[derive(Debug, Clone)]
pub struct BlogClient {
    http: Arc<Mutex<http_client::HttpClient>>,
}

impl BlogClient {
    /// Create a client for a server base URL (e.g., "http://localhost:5000")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Arc::new(Mutex::new(http_client::HttpClient::new(base_url))),
        }
    }

    /// Set the JWT token for authenticated requests
    pub async fn set_token(&self, token: String) {
        self.http.lock().await.set_token(token);
    }

    pub async fn get_token(&self) -> Option<String> {
        self.http.lock().await.get_token().cloned()
    }

    pub async fn clear_token(&self) {
        self.http.lock().await.clear_token();
    }

    pub async fn base_url(&self) -> String {
        self.http.lock().await.base_url().to_string()
    }

    /// Register a new user; the returned token is kept for later calls
    pub async fn register(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthResponse, BlogClientError> {
        let req = RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };
        tracing::debug!("Register called for email: {}", req.email);

        self.http.lock().await.register(req).await
    }

    /// Login with email and password; the returned token is kept for later calls
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthResponse, BlogClientError> {
        let req = LoginRequest {
            email: email.into(),
            password: password.into(),
        };
        tracing::debug!("Login called for email: {}", req.email);

        self.http.lock().await.login(req).await
    }

    /// All posts, newest first
    pub async fn list_posts(&self) -> Result<Vec<Post>, BlogClientError> {
        self.http.lock().await.list_posts().await
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, BlogClientError> {
        self.http.lock().await.get_post(id).await
    }

    /// Create a post (requires authentication), optionally uploading an image file
    pub async fn create_post(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
        image: Option<&Path>,
    ) -> Result<Post, BlogClientError> {
        let http = self.http.lock().await;
        http.create_post(title.into(), body.into(), image).await
    }

    /// Update a post (requires authentication, must be author).
    /// Fields left as `None` are not sent and keep their value.
    pub async fn update_post(
        &self,
        id: i64,
        title: Option<String>,
        body: Option<String>,
        image: Option<&Path>,
    ) -> Result<Post, BlogClientError> {
        let http = self.http.lock().await;
        http.update_post(id, title, body, image).await
    }

    /// Delete a post (requires authentication, must be author)
    pub async fn delete_post(&self, id: i64) -> Result<(), BlogClientError> {
        self.http.lock().await.delete_post(id).await
    }

    /// Like the post, or remove the like if the caller already liked it
    pub async fn toggle_like(&self, id: i64) -> Result<LikeResponse, BlogClientError> {
        self.http.lock().await.toggle_like(id).await
    }

    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, BlogClientError> {
        self.http.lock().await.list_comments(post_id).await
    }

    pub async fn add_comment(
        &self,
        post_id: i64,
        text: impl Into<String>,
    ) -> Result<Comment, BlogClientError> {
        self.http.lock().await.add_comment(post_id, text.into()).await
    }
}
