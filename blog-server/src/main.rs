use dotenvy::dotenv;
use std::sync::Arc;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

use application::{AuthService, BlogService, CommentService};
use data::{
    comment_repository::PostgresCommentRepository, post_repository::PostgresPostRepository,
    user_repository::PostgresUserRepository,
};
use infrastructure::{
    blob_store::{LocalDiskStore, PUBLIC_PREFIX},
    config::Config,
    database::{create_pool, run_migrations},
    jwt::JwtService,
    logging::init_logging,
};
use presentation::{routes, upload::UploadLimits};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    init_logging()?;

    let config = Config::from_env()?;

    tracing::info!("Starting blog server...");
    tracing::info!("HTTP server will listen on {}", config.http_addr());
    tracing::info!("CORS allowed origins: {}", config.cors_allowed_origins);

    // A database we cannot reach at startup is fatal
    tracing::info!("Connecting to database...");
    let pool = create_pool(&config).await?;

    tracing::info!("Running database migrations...");
    run_migrations(&pool).await?;

    tracing::info!("Initializing services...");

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret)?);
    let blob_store = Arc::new(LocalDiskStore::new(config.upload_dir.clone()).await?);

    // Repositories
    let user_repo = Arc::new(PostgresUserRepository::new(
        pool.clone(),
        config.store_timeout,
    ));
    let post_repo = Arc::new(PostgresPostRepository::new(
        pool.clone(),
        config.store_timeout,
    ));
    let comment_repo = Arc::new(PostgresCommentRepository::new(
        pool.clone(),
        config.store_timeout,
    ));

    // Application services
    let auth_service = Arc::new(AuthService::new(user_repo, jwt_service.clone()));
    let blog_service = Arc::new(BlogService::new(post_repo.clone(), blob_store));
    let comment_service = Arc::new(CommentService::new(comment_repo, post_repo));

    tracing::info!("Services initialized successfully");

    run_http_server(
        config,
        auth_service,
        blog_service,
        comment_service,
        jwt_service,
    )
    .await?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Configure CORS for the HTTP server with allowed origins from .env
fn configure_cors(allowed_origins: &str) -> actix_cors::Cors {
    use actix_cors::Cors;
    use actix_web::http::header;

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .max_age(3600);

    for origin in allowed_origins.split(',').map(str::trim) {
        if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
            tracing::debug!("Added allowed CORS origin: {}", origin);
        }
    }

    cors
}

async fn run_http_server(
    config: Config,
    auth_service: Arc<AuthService>,
    blog_service: Arc<BlogService>,
    comment_service: Arc<CommentService>,
    jwt_service: Arc<JwtService>,
) -> anyhow::Result<()> {
    use actix_web::{middleware::Logger, web, App, HttpServer};

    let addr = config.http_addr();
    let upload_dir = config.upload_dir.clone();
    let cors_allowed_origins = config.cors_allowed_origins.clone();
    let limits = UploadLimits {
        max_file_bytes: config.max_upload_bytes,
    };

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(configure_cors(&cors_allowed_origins))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(blog_service.clone()))
            .app_data(web::Data::new(comment_service.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(limits))
            .configure(routes::configure)
            // Uploaded images, read-only
            .service(actix_files::Files::new(PUBLIC_PREFIX, upload_dir.clone()))
    })
    .bind(&addr)?
    .run();

    tracing::info!("HTTP server running on {}", addr);

    server.await?;

    Ok(())
}
