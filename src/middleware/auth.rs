use crate::{
    error::{AppError, AppResult},
    models::User,
    utils::{
        cookie::{extract_cookie, ACCESS_TOKEN_COOKIE},
        jwt::verify_access_token,
    },
};
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::convert::Infallible;

/// Caller identity, inserted by `auth_middleware` on protected routes.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Caller identity on public routes. Missing or invalid credentials yield
/// `None` instead of a rejection; read paths use it for `has_liked`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalAuthUser(pub Option<i32>);

/// JWT authentication middleware.
///
/// Accepts `Authorization: Bearer` or the HttpOnly access cookie, loads the
/// user and rejects banned accounts.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = user_id_from_headers(&headers).ok_or(AppError::Unauthorized)?;

    let user = User::find_by_id(user_id)
        .one(&db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if user.role == "banned" {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(AuthUser {
        user_id: user.id,
        role: user.role,
    });

    Ok(next.run(request).await)
}

fn user_id_from_headers(headers: &HeaderMap) -> Option<i32> {
    let token = extract_bearer_token(headers)
        .or_else(|| extract_cookie(headers, ACCESS_TOKEN_COOKIE))?;
    verify_access_token(&token).ok()
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Verify the current user has the admin role.
pub fn require_admin(auth_user: &AuthUser) -> AppResult<i32> {
    if !auth_user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(auth_user.user_id)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(Self(Some(user.user_id)));
        }
        Ok(Self(user_id_from_headers(&parts.headers)))
    }
}
