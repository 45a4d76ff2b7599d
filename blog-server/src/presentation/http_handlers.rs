use crate::application::{AuthService, BlogService, CommentService};
use crate::domain::comment::CreateCommentRequest;
use crate::domain::post::{CreatePostRequest, UpdatePostRequest};
use crate::domain::user::{LoginUserRequest, RegisterUserRequest, UserResponse};
use crate::domain::DomainError;
use crate::presentation::middleware::AuthenticatedUser;
use crate::presentation::upload::{read_post_form, UploadLimits};
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use std::sync::Arc;

#[derive(serde::Serialize)]
struct AuthResponse {
    token: String,
    user: UserResponse,
}

#[derive(serde::Serialize)]
struct MessageResponse {
    message: String,
}

// Преобразование DomainError в HttpResponse
pub fn error_to_response(err: &DomainError) -> HttpResponse {
    let status = StatusCode::from_u16(err.to_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    // Internals of 5xx failures stay in the logs
    let message = match status {
        StatusCode::SERVICE_UNAVAILABLE => "Service temporarily unavailable".to_string(),
        s if s.is_server_error() => "Internal server error".to_string(),
        _ => err.to_string(),
    };

    HttpResponse::build(status).json(MessageResponse { message })
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.to_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        error_to_response(self)
    }
}

/// Maps malformed JSON bodies onto the same `{message}` shape as domain errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let domain = DomainError::ValidationError(err.to_string());
        let response = error_to_response(&domain);
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

/// Non-numeric ids in the path get a JSON 400 instead of actix's plain text.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let domain = DomainError::ValidationError(format!("Invalid path parameter: {}", err));
        let response = error_to_response(&domain);
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

// ============== Auth Handlers ==============

pub async fn register(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<RegisterUserRequest>,
) -> impl Responder {
    match auth_service.register(req.into_inner()).await {
        Ok((token, user)) => HttpResponse::Created().json(AuthResponse { token, user }),
        Err(err) => error_to_response(&err),
    }
}

pub async fn login(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<LoginUserRequest>,
) -> impl Responder {
    match auth_service.login(req.into_inner()).await {
        Ok((token, user)) => HttpResponse::Ok().json(AuthResponse { token, user }),
        Err(err) => error_to_response(&err),
    }
}

// ============== Post Handlers ==============

pub async fn list_posts(blog_service: web::Data<Arc<BlogService>>) -> impl Responder {
    tracing::info!("Listing posts");

    match blog_service.list_posts().await {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(err) => error_to_response(&err),
    }
}

pub async fn get_post(
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Getting post with id={}", post_id);

    match blog_service.get_post(post_id).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => error_to_response(&err),
    }
}

pub async fn create_post(
    user: AuthenticatedUser,
    blog_service: web::Data<Arc<BlogService>>,
    limits: web::Data<UploadLimits>,
    payload: Multipart,
) -> impl Responder {
    tracing::info!("Creating post for user_id={}", user.id());

    let form = match read_post_form(payload, *limits.get_ref()).await {
        Ok(form) => form,
        Err(err) => return error_to_response(&err),
    };

    let req = CreatePostRequest {
        title: form.title,
        body: form.body,
        image: form.image,
    };

    match blog_service.create_post(user.id(), req).await {
        Ok(post) => HttpResponse::Created().json(post),
        Err(err) => error_to_response(&err),
    }
}

pub async fn update_post(
    user: AuthenticatedUser,
    blog_service: web::Data<Arc<BlogService>>,
    limits: web::Data<UploadLimits>,
    path: web::Path<i64>,
    payload: Multipart,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Updating post id={} for user_id={}", post_id, user.id());

    let form = match read_post_form(payload, *limits.get_ref()).await {
        Ok(form) => form,
        Err(err) => return error_to_response(&err),
    };

    let req = UpdatePostRequest {
        title: form.title,
        body: form.body,
        image: form.image,
    };

    match blog_service.update_post(post_id, user.id(), req).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => error_to_response(&err),
    }
}

pub async fn delete_post(
    user: AuthenticatedUser,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Deleting post id={} for user_id={}", post_id, user.id());

    match blog_service.delete_post(post_id, user.id()).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse {
            message: "Deleted".to_string(),
        }),
        Err(err) => error_to_response(&err),
    }
}

pub async fn toggle_like(
    user: AuthenticatedUser,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    match blog_service.toggle_like(post_id, user.id()).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(err) => error_to_response(&err),
    }
}

// ============== Comment Handlers ==============

pub async fn list_comments(
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    match comment_service.list_comments(post_id).await {
        Ok(comments) => HttpResponse::Ok().json(comments),
        Err(err) => error_to_response(&err),
    }
}

pub async fn add_comment(
    user: AuthenticatedUser,
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<i64>,
    req: web::Json<CreateCommentRequest>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Adding comment to post id={} for user_id={}", post_id, user.id());

    match comment_service
        .add_comment(post_id, user.id(), req.into_inner())
        .await
    {
        Ok(comment) => HttpResponse::Created().json(comment),
        Err(err) => error_to_response(&err),
    }
}
