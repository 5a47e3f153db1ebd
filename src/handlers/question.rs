use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::models::{LikeTarget, QuestionModel};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery, SearchQuery};
use crate::services::like::LikeService;
use crate::services::question::QuestionService;
use crate::utils::render_markdown;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QuestionRequest {
    /// Question title (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Question body (Markdown supported)
    #[validate(length(min = 1))]
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionResponse {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub description_html: String,
    /// Vote count
    pub votes: i32,
    /// Whether the caller has voted for this question
    pub has_liked: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl QuestionResponse {
    pub fn new(q: QuestionModel, has_liked: bool) -> Self {
        let description_html = render_markdown(&q.description);
        Self {
            id: q.id,
            user_id: q.user_id,
            title: q.title,
            description: q.description,
            description_html,
            votes: q.votes,
            has_liked,
            created_at: q.created_at.to_string(),
            updated_at: q.updated_at.to_string(),
        }
    }
}

async fn with_vote_flags(
    db: DatabaseConnection,
    questions: Vec<QuestionModel>,
    user_id: Option<i32>,
) -> AppResult<Vec<QuestionResponse>> {
    let ids: Vec<i32> = questions.iter().map(|q| q.id).collect();
    let liked = LikeService::new(db)
        .liked_ids(LikeTarget::Question, &ids, user_id)
        .await?;

    Ok(questions
        .into_iter()
        .map(|q| {
            let has_liked = liked.contains(&q.id);
            QuestionResponse::new(q, has_liked)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/questions",
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List of questions", body = PaginatedResponse<QuestionResponse>),
    ),
    tag = "questions"
)]
pub async fn list_questions(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let service = QuestionService::new(db.clone());
    let (questions, total) = service.list(page, per_page).await?;
    let items = with_vote_flags(db, questions, user_id).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/questions/search",
    params(
        ("q" = String, Query, description = "Search term (3-200 characters)"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Matching questions", body = PaginatedResponse<QuestionResponse>),
        (status = 400, description = "Invalid query", body = AppError),
    ),
    tag = "questions"
)]
pub async fn search_questions(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Query(params): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let term = params.term()?;
    let (page, per_page) = params.resolve();

    let service = QuestionService::new(db.clone());
    let (questions, total) = service.search(term, page, per_page).await?;
    let items = with_vote_flags(db, questions, user_id).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/questions",
    params(
        ("id" = i32, Path, description = "User ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Questions asked by the user", body = PaginatedResponse<QuestionResponse>),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "questions"
)]
pub async fn list_user_questions(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Path(author_id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let service = QuestionService::new(db.clone());
    let (questions, total) = service.list_by_user(author_id, page, per_page).await?;
    let items = with_vote_flags(db, questions, user_id).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/questions/{id}",
    params(("id" = i32, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Question details", body = QuestionResponse),
        (status = 404, description = "Question not found", body = AppError),
    ),
    tag = "questions"
)]
pub async fn get_question(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let question = QuestionService::new(db.clone()).get_by_id(id).await?;
    let has_liked = LikeService::new(db)
        .has_liked(LikeTarget::Question, id, user_id)
        .await?;

    Ok(ApiResponse::ok(QuestionResponse::new(question, has_liked)))
}

#[utoipa::path(
    post,
    path = "/api/v1/questions",
    security(("jwt_token" = [])),
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Question created", body = QuestionResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "questions"
)]
pub async fn create_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<QuestionRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = QuestionService::new(db);
    let question = service
        .create(auth_user.user_id, &payload.title, &payload.description)
        .await?;

    Ok(ApiResponse::ok(QuestionResponse::new(question, false)))
}

#[utoipa::path(
    put,
    path = "/api/v1/questions/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Question ID")),
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = QuestionResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the author or an admin", body = AppError),
        (status = 404, description = "Question not found", body = AppError),
    ),
    tag = "questions"
)]
pub async fn update_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<QuestionRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let question = QuestionService::new(db.clone())
        .update(
            id,
            auth_user.user_id,
            auth_user.is_admin(),
            &payload.title,
            &payload.description,
        )
        .await?;
    let has_liked = LikeService::new(db)
        .has_liked(LikeTarget::Question, id, Some(auth_user.user_id))
        .await?;

    Ok(ApiResponse::ok(QuestionResponse::new(question, has_liked)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/questions/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Question, its answers and their votes deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Question not found", body = AppError),
    ),
    tag = "questions"
)]
pub async fn delete_question(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = QuestionService::new(db);
    service
        .delete(id, auth_user.user_id, auth_user.is_admin())
        .await?;

    Ok(ApiResponse::ok("Question deleted"))
}
