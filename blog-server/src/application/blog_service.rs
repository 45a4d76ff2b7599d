use crate::data::post_repository::PostRepository;
use crate::domain::post::{
    optional_text, require_text, AuthorResponse, CreatePostRequest, ImageUpload, LikeResponse,
    NewPost, PostChanges, PostResponse, UpdatePostRequest,
};
use crate::domain::{DomainError, Post};
use crate::infrastructure::blob_store::BlobStore;
use std::sync::Arc;

pub struct BlogService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    blob_store: Arc<dyn BlobStore + Send + Sync>,
}

impl BlogService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        blob_store: Arc<dyn BlobStore + Send + Sync>,
    ) -> Self {
        Self {
            post_repo,
            blob_store,
        }
    }

    pub async fn create_post(
        &self,
        author_id: i64,
        req: CreatePostRequest,
    ) -> Result<PostResponse, DomainError> {
        // Validate before anything touches disk or the database
        let title = require_text("title", req.title)?;
        let body = require_text("body", req.body)?;

        let image = self.store_image(req.image).await?;

        let post = match self
            .post_repo
            .create(
                author_id,
                NewPost {
                    title,
                    body,
                    image: image.clone(),
                },
            )
            .await
        {
            Ok(post) => post,
            Err(err) => {
                self.discard_image(image.as_deref()).await;
                return Err(err);
            }
        };

        tracing::info!("Post created: id={}, author_id={}", post.id, author_id);

        Ok(PostResponse::from(post))
    }

    pub async fn list_posts(&self) -> Result<Vec<PostResponse>, DomainError> {
        let posts = self.post_repo.list_populated().await?;

        Ok(posts
            .into_iter()
            .map(|p| PostResponse::with_author(p.post, AuthorResponse::name_and_email(p.author)))
            .collect())
    }

    pub async fn get_post(&self, id: i64) -> Result<PostResponse, DomainError> {
        let populated = self.post_repo.find_populated(id).await?;
        Ok(PostResponse::with_author(
            populated.post,
            AuthorResponse::name_only(populated.author),
        ))
    }

    pub async fn update_post(
        &self,
        id: i64,
        user_id: i64,
        req: UpdatePostRequest,
    ) -> Result<PostResponse, DomainError> {
        self.owned_post(id, user_id, "update").await?;

        let title = optional_text("title", req.title)?;
        let body = optional_text("body", req.body)?;
        let image = self.store_image(req.image).await?;

        // The post may have been deleted since the ownership check
        let updated_post = match self
            .post_repo
            .update(
                id,
                PostChanges {
                    title,
                    body,
                    image: image.clone(),
                },
            )
            .await
        {
            Ok(post) => post,
            Err(err) => {
                self.discard_image(image.as_deref()).await;
                return Err(err);
            }
        };

        tracing::info!("Post updated: id={}, author_id={}", id, user_id);

        Ok(PostResponse::from(updated_post))
    }

    pub async fn delete_post(&self, id: i64, user_id: i64) -> Result<(), DomainError> {
        self.owned_post(id, user_id, "delete").await?;

        self.post_repo.delete(id).await?;

        tracing::info!("Post deleted: id={}, author_id={}", id, user_id);

        Ok(())
    }

    pub async fn toggle_like(&self, id: i64, user_id: i64) -> Result<LikeResponse, DomainError> {
        let result = self.post_repo.toggle_like(id, user_id).await?;

        tracing::debug!(
            "Like toggled: post_id={}, user_id={}, liked={}, count={}",
            id,
            user_id,
            result.liked,
            result.likes_count
        );

        Ok(result)
    }

    async fn owned_post(&self, id: i64, user_id: i64, action: &str) -> Result<Post, DomainError> {
        let post = self.post_repo.find_by_id(id).await?;

        if post.author_id != user_id {
            tracing::warn!(
                "User {} attempted to {} post {} owned by {}",
                user_id,
                action,
                id,
                post.author_id
            );
            return Err(DomainError::Forbidden);
        }

        Ok(post)
    }

    async fn store_image(&self, image: Option<ImageUpload>) -> Result<Option<String>, DomainError> {
        match image {
            Some(upload) => {
                let reference = self
                    .blob_store
                    .put(&upload.file_name, upload.bytes)
                    .await?;
                Ok(Some(reference))
            }
            None => Ok(None),
        }
    }

    /// Removes a blob whose post write failed. A failure here only leaves an
    /// unreferenced file behind, so it is logged and not returned.
    async fn discard_image(&self, reference: Option<&str>) {
        if let Some(reference) = reference {
            if let Err(e) = self.blob_store.remove(reference).await {
                tracing::warn!("Failed to remove orphaned blob {}: {}", reference, e);
            }
        }
    }
}
