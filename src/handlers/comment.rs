use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::models::{CommentModel, LikeTarget};
use crate::response::ApiResponse;
use crate::services::comment::CommentService;
use crate::services::like::LikeService;
use crate::utils::render_markdown;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentRequest {
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub question_id: i32,
    pub user_id: i32,
    pub content: String,
    pub content_html: String,
    pub votes: i32,
    /// Chosen as the answer to the question
    pub is_accepted: bool,
    pub has_liked: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl CommentResponse {
    pub fn new(c: CommentModel, has_liked: bool) -> Self {
        let content_html = render_markdown(&c.content);
        Self {
            id: c.id,
            question_id: c.question_id,
            user_id: c.user_id,
            content: c.content,
            content_html,
            votes: c.votes,
            is_accepted: c.is_accepted,
            has_liked,
            created_at: c.created_at.to_string(),
            updated_at: c.updated_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/questions/{question_id}/comments",
    params(("question_id" = i32, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Answers to the question, accepted first", body = Vec<CommentResponse>),
        (status = 404, description = "Question not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Path(question_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let comments = CommentService::new(db.clone())
        .list_by_question(question_id)
        .await?;

    let ids: Vec<i32> = comments.iter().map(|c| c.id).collect();
    let liked = LikeService::new(db)
        .liked_ids(LikeTarget::Comment, &ids, user_id)
        .await?;

    let items: Vec<CommentResponse> = comments
        .into_iter()
        .map(|c| {
            let has_liked = liked.contains(&c.id);
            CommentResponse::new(c, has_liked)
        })
        .collect();

    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/v1/questions/{question_id}/comments",
    security(("jwt_token" = [])),
    params(("question_id" = i32, Path, description = "Question ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Answer posted", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Question not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(question_id): Path<i32>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CommentService::new(db);
    let comment = service
        .create(question_id, auth_user.user_id, &payload.content)
        .await?;

    Ok(ApiResponse::ok(CommentResponse::new(comment, false)))
}

#[utoipa::path(
    put,
    path = "/api/v1/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Answer updated", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the author or an admin", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn update_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let comment = CommentService::new(db.clone())
        .update(id, auth_user.user_id, auth_user.is_admin(), &payload.content)
        .await?;
    let has_liked = LikeService::new(db)
        .has_liked(LikeTarget::Comment, id, Some(auth_user.user_id))
        .await?;

    Ok(ApiResponse::ok(CommentResponse::new(comment, has_liked)))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{id}/accept",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Accepted flag flipped", body = CommentResponse),
        (status = 403, description = "Not the question author or an admin", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
        (status = 503, description = "Question busy, retry", body = AppError),
    ),
    tag = "comments"
)]
pub async fn accept_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let comment = CommentService::new(db.clone())
        .toggle_accepted(id, auth_user.user_id, auth_user.is_admin())
        .await?;
    let has_liked = LikeService::new(db)
        .has_liked(LikeTarget::Comment, id, Some(auth_user.user_id))
        .await?;

    Ok(ApiResponse::ok(CommentResponse::new(comment, has_liked)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment and its votes deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    service
        .delete(id, auth_user.user_id, auth_user.is_admin())
        .await?;

    Ok(ApiResponse::ok("Comment deleted"))
}
