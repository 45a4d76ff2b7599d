use crate::domain::DomainError;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// URL prefix under which stored blobs are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_EXTENSION_LEN: usize = 8;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under a freshly generated name and returns the public
    /// reference for it.
    async fn put(&self, original_name: &str, bytes: Vec<u8>) -> Result<String, DomainError>;

    /// Deletes the blob behind a reference returned by `put`. Removing a blob
    /// that is already gone succeeds.
    async fn remove(&self, reference: &str) -> Result<(), DomainError>;
}

pub struct LocalDiskStore {
    dir: PathBuf,
}

impl LocalDiskStore {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            DomainError::InternalError(format!(
                "Failed to create upload directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        tracing::info!("Upload directory ready: {}", dir.display());
        Ok(Self { dir })
    }
}

#[async_trait]
impl BlobStore for LocalDiskStore {
    async fn put(&self, original_name: &str, bytes: Vec<u8>) -> Result<String, DomainError> {
        let name = generate_name(original_name);
        let path = self.dir.join(&name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create blob {}: {}", path.display(), e);
                DomainError::InternalError(format!("Failed to store upload: {}", e))
            })?;

        let written = match file.write_all(&bytes).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            tracing::error!("Failed to write blob {}: {}", path.display(), e);
            drop(file);
            // No partial files
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                tracing::warn!("Failed to remove partial blob {}: {}", path.display(), rm);
            }
            return Err(DomainError::InternalError(format!(
                "Failed to store upload: {}",
                e
            )));
        }

        tracing::debug!("Stored blob {} ({} bytes)", name, bytes.len());
        Ok(format!("{}/{}", PUBLIC_PREFIX, name))
    }

    async fn remove(&self, reference: &str) -> Result<(), DomainError> {
        let name = blob_name(reference).ok_or_else(|| {
            DomainError::InternalError(format!("Not a blob reference: {}", reference))
        })?;
        let path = self.dir.join(name);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Removed blob {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::InternalError(format!(
                "Failed to remove blob {}: {}",
                name, e
            ))),
        }
    }
}

/// File name inside the upload directory for a `/uploads/<name>` reference.
/// Anything that could leave the directory is refused.
fn blob_name(reference: &str) -> Option<&str> {
    let name = reference.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
        return None;
    }
    Some(name)
}

/// `<unix-millis>-<uuid><.ext>`; the extension is kept only when it is short
/// and plain ASCII alphanumeric.
pub fn generate_name(original_name: &str) -> String {
    let stem = format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    );

    match extension(original_name) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn extension(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
