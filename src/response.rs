use crate::error::{AppError, AppResult};
use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;
const MIN_SEARCH_CHARS: usize = 3;
const MAX_SEARCH_CHARS: usize = 200;

/// Success envelope shared by every JSON endpoint. Errors use
/// `{"error": ...}` from `AppError` instead.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let total_pages = total.checked_div(per_page).map_or(0, |full| {
            if total % per_page == 0 {
                full
            } else {
                full + 1
            }
        });
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PaginationQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PaginationQuery {
    /// `(page, per_page)` with page starting at 1 and per_page in 1..=100.
    pub fn resolve(&self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }
}

/// `?q=` plus pagination for the search endpoints.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl SearchQuery {
    /// The trimmed search term, 3 to 200 characters.
    pub fn term(&self) -> AppResult<&str> {
        let term = self.q.as_deref().unwrap_or_default().trim();
        let chars = term.chars().count();
        if !(MIN_SEARCH_CHARS..=MAX_SEARCH_CHARS).contains(&chars) {
            return Err(AppError::Validation(format!(
                "Search query must be {}-{} characters",
                MIN_SEARCH_CHARS, MAX_SEARCH_CHARS
            )));
        }
        Ok(term)
    }

    pub fn resolve(&self) -> (u64, u64) {
        PaginationQuery {
            page: self.page,
            per_page: self.per_page,
        }
        .resolve()
    }
}
