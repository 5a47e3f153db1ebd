use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::models::{ArticleModel, LikeTarget};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery, SearchQuery};
use crate::services::article::ArticleService;
use crate::services::like::LikeService;
use crate::utils::{excerpt, render_markdown};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ArticleRequest {
    /// Article title (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Article content (Markdown supported)
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleResponse {
    /// Article ID
    pub id: i32,
    /// Author user ID
    pub user_id: i32,
    /// Article title
    pub title: String,
    /// Article content (Markdown)
    pub content: String,
    /// Rendered HTML content
    pub content_html: String,
    /// Plain-text preview
    pub excerpt: String,
    /// Like count
    pub likes: i32,
    /// Whether the caller has liked this article
    pub has_liked: bool,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl ArticleResponse {
    pub fn new(a: ArticleModel, has_liked: bool) -> Self {
        let content_html = render_markdown(&a.content);
        let excerpt = excerpt(&a.content, EXCERPT_CHARS);
        Self {
            id: a.id,
            user_id: a.user_id,
            title: a.title,
            content: a.content,
            content_html,
            excerpt,
            likes: a.likes,
            has_liked,
            created_at: a.created_at.to_string(),
            updated_at: a.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MostLikedQuery {
    /// Number of articles (default 5, max 50)
    pub limit: Option<u64>,
}

async fn with_like_flags(
    db: DatabaseConnection,
    articles: Vec<ArticleModel>,
    user_id: Option<i32>,
) -> AppResult<Vec<ArticleResponse>> {
    let ids: Vec<i32> = articles.iter().map(|a| a.id).collect();
    let liked = LikeService::new(db)
        .liked_ids(LikeTarget::Article, &ids, user_id)
        .await?;

    Ok(articles
        .into_iter()
        .map(|a| {
            let has_liked = liked.contains(&a.id);
            ArticleResponse::new(a, has_liked)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/articles",
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List of articles", body = PaginatedResponse<ArticleResponse>),
    ),
    tag = "articles"
)]
pub async fn list_articles(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let service = ArticleService::new(db.clone());
    let (articles, total) = service.list(page, per_page).await?;
    let items = with_like_flags(db, articles, user_id).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/articles/search",
    params(
        ("q" = String, Query, description = "Search term (3-200 characters)"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Matching articles", body = PaginatedResponse<ArticleResponse>),
        (status = 400, description = "Invalid query", body = AppError),
    ),
    tag = "articles"
)]
pub async fn search_articles(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Query(params): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let term = params.term()?;
    let (page, per_page) = params.resolve();

    let service = ArticleService::new(db.clone());
    let (articles, total) = service.search(term, page, per_page).await?;
    let items = with_like_flags(db, articles, user_id).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/articles",
    params(
        ("id" = i32, Path, description = "User ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Articles written by the user", body = PaginatedResponse<ArticleResponse>),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn list_user_articles(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Path(author_id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let service = ArticleService::new(db.clone());
    let (articles, total) = service.list_by_user(author_id, page, per_page).await?;
    let items = with_like_flags(db, articles, user_id).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/articles/most-liked",
    params(("limit" = Option<u64>, Query, description = "Number of articles (default 5, max 50)")),
    responses(
        (status = 200, description = "Most liked articles", body = Vec<ArticleResponse>),
    ),
    tag = "articles"
)]
pub async fn most_liked_articles(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Query(params): Query<MostLikedQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit.unwrap_or(5).clamp(1, 50);

    let service = ArticleService::new(db.clone());
    let articles = service.most_liked(limit).await?;
    let items = with_like_flags(db, articles, user_id).await?;

    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/articles/{id}",
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article details", body = ArticleResponse),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn get_article(
    Extension(db): Extension<DatabaseConnection>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let article = ArticleService::new(db.clone()).get_by_id(id).await?;
    let has_liked = LikeService::new(db)
        .has_liked(LikeTarget::Article, id, user_id)
        .await?;

    Ok(ApiResponse::ok(ArticleResponse::new(article, has_liked)))
}

#[utoipa::path(
    post,
    path = "/api/v1/articles",
    security(("jwt_token" = [])),
    request_body = ArticleRequest,
    responses(
        (status = 200, description = "Article created", body = ArticleResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "articles"
)]
pub async fn create_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<ArticleRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ArticleService::new(db);
    let article = service
        .create(auth_user.user_id, &payload.title, &payload.content)
        .await?;

    Ok(ApiResponse::ok(ArticleResponse::new(article, false)))
}

#[utoipa::path(
    put,
    path = "/api/v1/articles/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    request_body = ArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = ArticleResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the author or an admin", body = AppError),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn update_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ArticleRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let article = ArticleService::new(db.clone())
        .update(
            id,
            auth_user.user_id,
            auth_user.is_admin(),
            &payload.title,
            &payload.content,
        )
        .await?;
    let has_liked = LikeService::new(db)
        .has_liked(LikeTarget::Article, id, Some(auth_user.user_id))
        .await?;

    Ok(ApiResponse::ok(ArticleResponse::new(article, has_liked)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/articles/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article and its likes deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn delete_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ArticleService::new(db);
    service
        .delete(id, auth_user.user_id, auth_user.is_admin())
        .await?;

    Ok(ApiResponse::ok("Article deleted"))
}
