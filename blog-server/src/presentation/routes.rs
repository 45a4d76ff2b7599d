use crate::presentation::http_handlers;
use actix_web::web;

/// API routes. Reads are public; handlers that take an `AuthenticatedUser`
/// reject requests without a valid bearer token.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(http_handlers::json_config())
        .app_data(http_handlers::path_config())
        .service(
            web::scope("/api/auth")
                .route("/register", web::post().to(http_handlers::register))
                .route("/login", web::post().to(http_handlers::login)),
        )
        .service(
            web::scope("/api/posts")
                .route("", web::get().to(http_handlers::list_posts))
                .route("", web::post().to(http_handlers::create_post))
                .route("/{id}", web::get().to(http_handlers::get_post))
                .route("/{id}", web::put().to(http_handlers::update_post))
                .route("/{id}", web::delete().to(http_handlers::delete_post))
                .route("/{id}/like", web::post().to(http_handlers::toggle_like)),
        )
        .service(
            web::scope("/api/comments")
                .route("/{post_id}", web::get().to(http_handlers::list_comments))
                .route("/{post_id}", web::post().to(http_handlers::add_comment)),
        );
}
