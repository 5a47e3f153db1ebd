use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::utils::cookie::{build_auth_cookie, build_clear_cookie, ACCESS_TOKEN_COOKIE};
use crate::utils::jwt::access_token_ttl;
use anyhow::anyhow;
use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Either the username or the email address.
    pub username: String,
    pub password: String,
}

/// Issued on register and login. The token is also set as the
/// `access_token` cookie.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
    pub username: String,
}

/// Public view of an account; never includes the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    /// `user`, `admin` or `banned`
    pub role: String,
    pub created_at: String,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            bio: user.bio,
            role: user.role,
            created_at: user.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Username or email already exists", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Response> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let (user, token) = AuthService::new(db)
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    session_response(user, token, Some("Registration successful."))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
        (status = 403, description = "Account banned", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Response> {
    let (user, token) = AuthService::new(db)
        .login(&payload.username, &payload.password)
        .await?;

    session_response(user, token, None)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user retrieved successfully", body = UserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user = AuthService::new(db)
        .get_user_by_id(auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Logout successful", body = String),
    ),
    tag = "auth"
)]
pub async fn logout() -> AppResult<Response> {
    let mut response = ApiResponse::ok("Logout successful").into_response();
    append_set_cookie(&mut response, &build_clear_cookie(ACCESS_TOKEN_COOKIE))?;
    Ok(response)
}

/// Envelope with the token in the body, plus the same token as an HttpOnly cookie.
fn session_response(user: UserModel, token: String, message: Option<&str>) -> AppResult<Response> {
    let cookie = build_auth_cookie(ACCESS_TOKEN_COOKIE, &token, access_token_ttl());
    let body = AuthResponse {
        token,
        user_id: user.id,
        username: user.username,
    };
    let mut response = match message {
        Some(message) => ApiResponse::with_message(body, message.to_string()),
        None => ApiResponse::ok(body),
    }
    .into_response();

    append_set_cookie(&mut response, &cookie)?;
    Ok(response)
}

fn append_set_cookie(response: &mut Response, cookie: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::Internal(anyhow!("Invalid Set-Cookie value: {}", e)))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
