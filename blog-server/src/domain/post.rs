use super::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub author_id: i64,
    pub likes: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subset of the author's user record resolved alongside a post or comment.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct PopulatedPost {
    pub post: Post,
    pub author: AuthorProfile,
}

/// Raw uploaded file as extracted from a multipart body.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Partial update: `None` leaves the stored field untouched.
#[derive(Debug, Default)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Validated insert for the store.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub image: Option<String>,
}

/// Validated partial update for the store.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub likes_count: i64,
    pub liked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorResponse {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthorResponse {
    pub fn id_only(id: i64) -> Self {
        Self {
            id,
            name: None,
            email: None,
        }
    }

    pub fn name_only(profile: AuthorProfile) -> Self {
        Self {
            id: profile.id,
            name: Some(profile.name),
            email: None,
        }
    }

    pub fn name_and_email(profile: AuthorProfile) -> Self {
        Self {
            id: profile.id,
            name: Some(profile.name),
            email: Some(profile.email),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub author: AuthorResponse,
    pub likes: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    pub fn with_author(post: Post, author: AuthorResponse) -> Self {
        Self {
            id: post.id,
            title: post.title,
            body: post.body,
            image: post.image,
            author,
            likes: post.likes,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let author = AuthorResponse::id_only(post.author_id);
        Self::with_author(post, author)
    }
}

/// Rejects a missing or whitespace-only required field.
pub fn require_text(field: &str, value: Option<String>) -> Result<String, DomainError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(DomainError::ValidationError(format!(
            "{} cannot be empty",
            field
        ))),
        None => Err(DomainError::ValidationError(format!(
            "{} is required",
            field
        ))),
    }
}

/// Like [`require_text`] but an absent value stays absent.
pub fn optional_text(field: &str, value: Option<String>) -> Result<Option<String>, DomainError> {
    value.map(|v| require_text(field, Some(v))).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_distinguishes_missing_and_blank() {
        let missing = require_text("title", None).unwrap_err();
        assert_eq!(missing.to_string(), "Validation error: title is required");

        let blank = require_text("title", Some("   ".into())).unwrap_err();
        assert_eq!(blank.to_string(), "Validation error: title cannot be empty");

        assert_eq!(require_text("title", Some("A".into())).unwrap(), "A");
    }

    #[test]
    fn optional_text_keeps_absent_fields_absent() {
        assert_eq!(optional_text("body", None).unwrap(), None);
        assert_eq!(
            optional_text("body", Some("B".into())).unwrap(),
            Some("B".to_string())
        );
        assert!(optional_text("body", Some(String::new())).is_err());
    }

    #[test]
    fn response_uses_camel_case_and_hides_missing_author_fields() {
        let now = Utc::now();
        let post = Post {
            id: 7,
            title: "A".into(),
            body: "B".into(),
            image: None,
            author_id: 1,
            likes: vec![2],
            created_at: now,
            updated_at: now,
        };
        let profile = AuthorProfile {
            id: 1,
            name: "Ann".into(),
            email: "ann@example.com".into(),
        };

        let json =
            serde_json::to_value(PostResponse::with_author(post, AuthorResponse::name_only(profile)))
                .unwrap();

        assert_eq!(json["author"], serde_json::json!({ "id": 1, "name": "Ann" }));
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["likes"], serde_json::json!([2]));

        let like = serde_json::to_value(LikeResponse {
            likes_count: 1,
            liked: true,
        })
        .unwrap();
        assert_eq!(like, serde_json::json!({ "likesCount": 1, "liked": true }));
    }
}
