use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sea_orm::{sqlx, DbErr, RuntimeErr};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Not found")]
    NotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid target type: {0}")]
    InvalidTarget(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Lock timeout, deadlock or serialization failure. Safe to retry the request.
    #[error("Transient database contention: {0}")]
    Transient(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if is_contention(&err) {
            AppError::Transient(err.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

/// SQLSTATEs for lock_not_available (raised by `lock_timeout`),
/// deadlock_detected and serialization_failure.
const CONTENTION_SQLSTATES: [&str; 3] = ["55P03", "40P01", "40001"];

fn is_contention(err: &DbErr) -> bool {
    sqlstate(err).is_some_and(|code| is_contention_code(&code))
}

fn is_contention_code(code: &str) -> bool {
    CONTENTION_SQLSTATES.contains(&code)
}

fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db))) => {
            db.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl utoipa::ToSchema for AppError {
    fn name() -> std::borrow::Cow<'static, str> {
        "ErrorResponse".into()
    }
}

impl utoipa::PartialSchema for AppError {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ErrorResponse::schema()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InvalidTarget(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::Jwt(e) => {
                tracing::error!("JWT error: {:?}", e);
                "Invalid token".to_string()
            }
            AppError::NotFound => "Resource not found".to_string(),
            AppError::Forbidden => "Forbidden".to_string(),
            AppError::InvalidTarget(kind) => format!("Invalid entity type: {kind}"),
            AppError::Validation(msg) => msg,
            AppError::Conflict(msg) => msg,
            AppError::Transient(e) => {
                tracing::warn!("Transient contention: {}", e);
                "Service busy, please retry".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "Internal server error".to_string()
            }
        };

        let body = json!({
            "error": error_message,
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_target_is_bad_request() {
        let err = AppError::InvalidTarget("widget".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid target type: widget");
    }

    #[test]
    fn ledger_taxonomy_status_codes() {
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Transient("deadlock".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn contention_sqlstates() {
        assert!(is_contention_code("55P03"));
        assert!(is_contention_code("40P01"));
        assert!(is_contention_code("40001"));
        // unique_violation is a real conflict, not contention
        assert!(!is_contention_code("23505"));
    }

    #[test]
    fn message_text_alone_is_not_contention() {
        let err: AppError = DbErr::Custom("deadlock detected".to_string()).into();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn other_db_errors_stay_database() {
        let err: AppError = DbErr::RecordNotFound("likes".to_string()).into();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_body_hides_database_details() {
        let resp = AppError::Database(DbErr::Custom("secret".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
