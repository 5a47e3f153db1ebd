mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;

use axum::{
    extract::Extension,
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::get_current_user,
        crate::handlers::auth::logout,
        // Like routes
        crate::handlers::like::toggle_like,
        crate::handlers::like::like_status,
        // Article routes
        crate::handlers::article::list_articles,
        crate::handlers::article::search_articles,
        crate::handlers::article::list_user_articles,
        crate::handlers::article::most_liked_articles,
        crate::handlers::article::get_article,
        crate::handlers::article::create_article,
        crate::handlers::article::update_article,
        crate::handlers::article::delete_article,
        // Question routes
        crate::handlers::question::list_questions,
        crate::handlers::question::search_questions,
        crate::handlers::question::list_user_questions,
        crate::handlers::question::get_question,
        crate::handlers::question::create_question,
        crate::handlers::question::update_question,
        crate::handlers::question::delete_question,
        // Comment routes
        crate::handlers::comment::list_comments,
        crate::handlers::comment::create_comment,
        crate::handlers::comment::update_comment,
        crate::handlers::comment::accept_comment,
        crate::handlers::comment::delete_comment,
        // Admin routes
        crate::handlers::admin::get_stats,
        crate::handlers::admin::list_users,
        crate::handlers::admin::update_user_role,
        crate::handlers::admin::delete_user,
        crate::handlers::like::rebuild_counters,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::PaginatedResponse<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::response::SearchQuery,
            crate::error::AppError,
            crate::models::LikeTarget,
            // Auth
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::UserResponse,
            // Like
            crate::handlers::like::LikeStatusResponse,
            crate::handlers::like::RebuildCountersResponse,
            // Article
            crate::handlers::article::ArticleRequest,
            crate::handlers::article::ArticleResponse,
            crate::handlers::article::MostLikedQuery,
            // Question
            crate::handlers::question::QuestionRequest,
            crate::handlers::question::QuestionResponse,
            // Comment
            crate::handlers::comment::CommentRequest,
            crate::handlers::comment::CommentResponse,
            // Admin
            crate::services::admin::AdminStats,
            crate::handlers::admin::UpdateRoleRequest,
        )
    ),
    tags(
        (name = "auth", description = "Authentication operations"),
        (name = "likes", description = "Like/vote toggles and status"),
        (name = "articles", description = "Article operations"),
        (name = "questions", description = "Question operations"),
        (name = "comments", description = "Answer operations"),
        (name = "admin", description = "Administrative operations"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    init_tracing();

    let (jwt_config, db_config) = load_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Quorum API v{}...", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Like lock timeout: {}ms",
        config::ledger::LedgerConfig::global().lock_timeout_ms
    );

    let db = config::database::connect(&db_config).await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let app = create_app().layer(Extension(db));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let json_logs = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quorum=debug,tower_http=debug,axum=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Everything required to boot, read before any I/O so a bad env fails fast.
fn load_config() -> anyhow::Result<(config::jwt::JwtConfig, config::database::DatabaseConfig)> {
    let jwt = config::jwt::JwtConfig::from_env()?;
    let database = config::database::DatabaseConfig::from_env()?;
    Ok((jwt, database))
}

/// `None` means any origin; otherwise the parseable entries of a comma list.
fn cors_origins(raw: &str) -> Option<Vec<HeaderValue>> {
    if raw.trim() == "*" {
        return None;
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect(),
    )
}

fn build_cors_layer() -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let raw = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
    match cors_origins(&raw) {
        None => cors.allow_origin(tower_http::cors::Any),
        // Credentialed CORS requires an explicit origin list.
        Some(origins) => cors.allow_origin(origins).allow_credentials(true),
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Quorum API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_allows_any_origin() {
        assert!(cors_origins(" * ").is_none());
    }

    #[test]
    fn origin_list_skips_blanks() {
        let origins = cors_origins("http://a.test, ,http://b.test").unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1], "http://b.test");
    }
}
