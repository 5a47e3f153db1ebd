use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser, OptionalAuthUser};
use crate::models::LikeTarget;
use crate::response::ApiResponse;
use crate::services::like::LikeService;
use axum::{extract::Path, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeStatusResponse {
    /// Whether the caller has liked the entity after this request
    pub liked: bool,
    /// Current like/vote count of the entity
    pub count: i64,
    /// Entity ID
    pub entity_id: i32,
    /// Entity kind: article, question or comment
    pub entity_type: LikeTarget,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RebuildCountersResponse {
    /// Articles whose `likes` counter was corrected
    pub articles: u64,
    /// Questions whose `votes` counter was corrected
    pub questions: u64,
    /// Comments whose `votes` counter was corrected
    pub comments: u64,
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/{entity_type}/{id}",
    security(("jwt_token" = [])),
    params(
        ("entity_type" = String, Path, description = "articles, questions or comments"),
        ("id" = i32, Path, description = "Entity ID"),
    ),
    responses(
        (status = 200, description = "Like toggled", body = LikeStatusResponse),
        (status = 400, description = "Unknown entity type", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Entity not found", body = AppError),
        (status = 503, description = "Contention, retry the request", body = AppError),
    ),
    tag = "likes"
)]
pub async fn toggle_like(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path((entity_type, id)): Path<(String, i32)>,
) -> AppResult<impl IntoResponse> {
    let target: LikeTarget = entity_type.parse()?;

    let service = LikeService::new(db);
    let result = service.toggle(target, id, Some(auth_user.user_id)).await?;

    Ok(ApiResponse::ok(LikeStatusResponse {
        liked: result.liked,
        count: result.count,
        entity_id: id,
        entity_type: target,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/likes/{entity_type}/{id}",
    params(
        ("entity_type" = String, Path, description = "articles, questions or comments"),
        ("id" = i32, Path, description = "Entity ID"),
    ),
    responses(
        (status = 200, description = "Like status of the caller", body = LikeStatusResponse),
        (status = 400, description = "Unknown entity type", body = AppError),
    ),
    tag = "likes"
)]
pub async fn like_status(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Path((entity_type, id)): Path<(String, i32)>,
) -> AppResult<impl IntoResponse> {
    let target: LikeTarget = entity_type.parse()?;

    let service = LikeService::new(db);
    let liked = service.has_liked(target, id, user_id).await?;
    let count = service.count(target, id).await?;

    Ok(ApiResponse::ok(LikeStatusResponse {
        liked,
        count,
        entity_id: id,
        entity_type: target,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/likes/rebuild",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Counters recomputed from like marks", body = RebuildCountersResponse),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn rebuild_counters(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    let service = LikeService::new(db);
    let report = service.rebuild_counters().await?;

    Ok(ApiResponse::ok(RebuildCountersResponse {
        articles: report.articles,
        questions: report.questions,
        comments: report.comments,
    }))
}
