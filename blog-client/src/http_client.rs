use crate::error::BlogClientError;
use crate::models::{
    AuthResponse, Comment, CreateCommentRequest, LikeResponse, LoginRequest, MessageResponse,
    Post, RegisterRequest,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    fn add_auth_header(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    // ==================== Auth ====================

    pub async fn register(&mut self, req: RegisterRequest) -> Result<AuthResponse, BlogClientError> {
        let url = self.url("/api/auth/register");
        let response = self.client.post(&url).json(&req).send().await?;

        let auth: AuthResponse = handle_json(response).await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    pub async fn login(&mut self, req: LoginRequest) -> Result<AuthResponse, BlogClientError> {
        let url = self.url("/api/auth/login");
        let response = self.client.post(&url).json(&req).send().await?;

        let auth: AuthResponse = handle_json(response).await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    // ==================== Posts ====================

    pub async fn list_posts(&self) -> Result<Vec<Post>, BlogClientError> {
        let url = self.url("/api/posts");
        let response = self.client.get(&url).send().await?;
        handle_json(response).await
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, BlogClientError> {
        let url = self.url(&format!("/api/posts/{}", id));
        let response = self.client.get(&url).send().await?;
        handle_json(response).await
    }

    pub async fn create_post(
        &self,
        title: String,
        body: String,
        image: Option<&Path>,
    ) -> Result<Post, BlogClientError> {
        let url = self.url("/api/posts");
        let form = post_form(Some(title), Some(body), image).await?;

        let response = self
            .add_auth_header(self.client.post(&url))
            .multipart(form)
            .send()
            .await?;

        handle_json(response).await
    }

    pub async fn update_post(
        &self,
        id: i64,
        title: Option<String>,
        body: Option<String>,
        image: Option<&Path>,
    ) -> Result<Post, BlogClientError> {
        let url = self.url(&format!("/api/posts/{}", id));
        let form = post_form(title, body, image).await?;

        let response = self
            .add_auth_header(self.client.put(&url))
            .multipart(form)
            .send()
            .await?;

        handle_json(response).await
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), BlogClientError> {
        let url = self.url(&format!("/api/posts/{}", id));
        let response = self
            .add_auth_header(self.client.delete(&url))
            .send()
            .await?;

        let _: MessageResponse = handle_json(response).await?;
        Ok(())
    }

    pub async fn toggle_like(&self, id: i64) -> Result<LikeResponse, BlogClientError> {
        let url = self.url(&format!("/api/posts/{}/like", id));
        let response = self
            .add_auth_header(self.client.post(&url))
            .send()
            .await?;

        handle_json(response).await
    }

    // ==================== Comments ====================

    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, BlogClientError> {
        let url = self.url(&format!("/api/comments/{}", post_id));
        let response = self.client.get(&url).send().await?;
        handle_json(response).await
    }

    pub async fn add_comment(&self, post_id: i64, text: String) -> Result<Comment, BlogClientError> {
        let url = self.url(&format!("/api/comments/{}", post_id));
        let response = self
            .add_auth_header(self.client.post(&url))
            .json(&CreateCommentRequest { text })
            .send()
            .await?;

        handle_json(response).await
    }
}

async fn post_form(
    title: Option<String>,
    body: Option<String>,
    image: Option<&Path>,
) -> Result<Form, BlogClientError> {
    let mut form = Form::new();

    if let Some(title) = title {
        form = form.text("title", title);
    }
    if let Some(body) = body {
        form = form.text("body", body);
    }
    if let Some(path) = image {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        tracing::debug!("Attaching image {} ({} bytes)", file_name, bytes.len());
        form = form.part("image", Part::bytes(bytes).file_name(file_name));
    }

    Ok(form)
}

async fn handle_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BlogClientError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await?;
    Err(error_for_status(status, &body))
}

/// Maps a non-success response to a client error, preferring the server's
/// `{"message": ...}` body over the raw text.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> BlogClientError {
    let message = serde_json::from_str::<MessageResponse>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::NOT_FOUND => BlogClientError::NotFound,
        StatusCode::UNAUTHORIZED => BlogClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => BlogClientError::Forbidden(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::PAYLOAD_TOO_LARGE => {
            BlogClientError::InvalidRequest(message)
        }
        _ => BlogClientError::ServerError(format!("HTTP {}: {}", status, message)),
    }
}
