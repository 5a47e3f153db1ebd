use crate::config::rate_limit::{RateLimitConfig, RateLimitGroup};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected = protected_routes(&rate_limit_config)
        .merge(like_routes(&rate_limit_config))
        .layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Auth routes: register, login.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login));

    with_optional_rate_limit(router, config, RateLimitGroup::Auth)
}

/// Public read routes. Identity is optional here and only feeds `has_liked`.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Articles
        .route(
            "/articles",
            routing::get(handlers::article::list_articles),
        )
        .route(
            "/articles/most-liked",
            routing::get(handlers::article::most_liked_articles),
        )
        .route(
            "/articles/search",
            routing::get(handlers::article::search_articles),
        )
        .route(
            "/articles/{id}",
            routing::get(handlers::article::get_article),
        )
        // Questions
        .route(
            "/questions",
            routing::get(handlers::question::list_questions),
        )
        .route(
            "/questions/search",
            routing::get(handlers::question::search_questions),
        )
        .route(
            "/questions/{id}",
            routing::get(handlers::question::get_question),
        )
        // Per-author listings
        .route(
            "/users/{id}/articles",
            routing::get(handlers::article::list_user_articles),
        )
        .route(
            "/users/{id}/questions",
            routing::get(handlers::question::list_user_questions),
        )
        // Comments
        .route(
            "/questions/{question_id}/comments",
            routing::get(handlers::comment::list_comments),
        )
        // Likes
        .route(
            "/likes/{entity_type}/{id}",
            routing::get(handlers::like::like_status),
        );

    with_optional_rate_limit(router, config, RateLimitGroup::PublicRead)
}

/// Protected routes: all authenticated writes except like toggles.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        .route("/auth/logout", routing::post(handlers::auth::logout))
        // Articles
        .route(
            "/articles",
            routing::post(handlers::article::create_article),
        )
        .route(
            "/articles/{id}",
            routing::put(handlers::article::update_article)
                .delete(handlers::article::delete_article),
        )
        // Questions
        .route(
            "/questions",
            routing::post(handlers::question::create_question),
        )
        .route(
            "/questions/{id}",
            routing::put(handlers::question::update_question)
                .delete(handlers::question::delete_question),
        )
        // Comments
        .route(
            "/questions/{question_id}/comments",
            routing::post(handlers::comment::create_comment),
        )
        .route(
            "/comments/{id}",
            routing::put(handlers::comment::update_comment)
                .delete(handlers::comment::delete_comment),
        )
        .route(
            "/comments/{id}/accept",
            routing::post(handlers::comment::accept_comment),
        )
        // Admin
        .route("/admin/stats", routing::get(handlers::admin::get_stats))
        .route("/admin/users", routing::get(handlers::admin::list_users))
        .route(
            "/admin/users/{id}",
            routing::delete(handlers::admin::delete_user),
        )
        .route(
            "/admin/users/{id}/role",
            routing::put(handlers::admin::update_user_role),
        )
        .route(
            "/admin/likes/rebuild",
            routing::post(handlers::like::rebuild_counters),
        );

    with_optional_rate_limit(router, config, RateLimitGroup::Protected)
}

/// Like toggles. Authenticated, with their own rate limit.
fn like_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new().route(
        "/likes/{entity_type}/{id}",
        routing::post(handlers::like::toggle_like),
    );

    with_optional_rate_limit(router, config, RateLimitGroup::Likes)
}

fn with_optional_rate_limit(
    router: Router,
    config: &RateLimitConfig,
    group: RateLimitGroup,
) -> Router {
    if !config.enabled {
        return router;
    }

    let rule = config.rule(group);
    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::warn!("Invalid rate limit rule for {:?}, limiter disabled", group);
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
