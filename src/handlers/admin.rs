use super::auth::UserResponse;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::admin::{AdminService, AdminStats};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    /// user, admin or banned
    #[validate(length(min = 1, max = 20))]
    pub role: String,
}

/// Every admin route starts here: the caller must be an admin.
fn admin_service(db: DatabaseConnection, auth_user: &AuthUser) -> AppResult<AdminService> {
    require_admin(auth_user)?;
    Ok(AdminService::new(db))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Row counts across the platform", body = AdminStats),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn get_stats(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let stats = admin_service(db, &auth_user)?.get_stats().await?;
    Ok(ApiResponse::ok(stats))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Users, newest first", body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let service = admin_service(db, &auth_user)?;
    let (page, per_page) = params.resolve();

    let (users, total) = service.list_users(page, per_page).await?;
    let items = users.into_iter().map(UserResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = UserResponse),
        (status = 400, description = "Unknown role, or an admin demoting themselves", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "No such user", body = AppError),
    ),
    tag = "admin"
)]
pub async fn update_user_role(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    let service = admin_service(db, &auth_user)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if auth_user.user_id == id && payload.role != "admin" {
        return Err(AppError::Validation(
            "Admins cannot demote themselves".to_string(),
        ));
    }

    let user = service.update_user_role(id, &payload.role).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User, their content and their likes deleted", body = String),
        (status = 403, description = "Admin only, or an admin deleting themselves", body = AppError),
        (status = 404, description = "No such user", body = AppError),
        (status = 503, description = "Content busy, retry", body = AppError),
    ),
    tag = "admin"
)]
pub async fn delete_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = admin_service(db, &auth_user)?;
    service.delete_user(id, auth_user.user_id).await?;
    Ok(ApiResponse::ok("User deleted"))
}
