use crate::domain::post::ImageUpload;
use crate::domain::DomainError;
use actix_multipart::{Field, Multipart};
use futures_util::StreamExt;

const IMAGE_FIELD: &str = "image";
const MAX_TEXT_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
}

/// Text parts and the optional image of a post create/update form.
#[derive(Debug, Default)]
pub struct PostForm {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Reads a `multipart/form-data` body with `title`, `body` and at most one
/// `image` file part. Other text parts are drained and ignored.
pub async fn read_post_form(
    mut payload: Multipart,
    limits: UploadLimits,
) -> Result<PostForm, DomainError> {
    let mut form = PostForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| DomainError::MalformedUpload(e.to_string()))?;

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        match file_name {
            Some(file_name) => {
                if name != IMAGE_FIELD {
                    return Err(DomainError::MalformedUpload(format!(
                        "unexpected file part '{}'",
                        name
                    )));
                }
                let bytes = read_field(&mut field, limits.max_file_bytes).await?;
                // Browsers send an empty part when no file was chosen
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                if form.image.is_some() {
                    return Err(DomainError::MalformedUpload(
                        "only one image file is allowed".to_string(),
                    ));
                }
                tracing::debug!("Received image '{}' ({} bytes)", file_name, bytes.len());
                form.image = Some(ImageUpload { file_name, bytes });
            }
            None => match name.as_str() {
                "title" => form.title = Some(read_text(&mut field).await?),
                "body" => form.body = Some(read_text(&mut field).await?),
                _ => {
                    read_field(&mut field, MAX_TEXT_BYTES).await?;
                }
            },
        }
    }

    Ok(form)
}

async fn read_text(field: &mut Field) -> Result<String, DomainError> {
    let bytes = read_field(field, MAX_TEXT_BYTES).await?;
    String::from_utf8(bytes)
        .map_err(|_| DomainError::MalformedUpload("text part is not valid UTF-8".to_string()))
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, DomainError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| DomainError::MalformedUpload(e.to_string()))?;
        if bytes.len() + chunk.len() > limit {
            return Err(DomainError::UploadTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
