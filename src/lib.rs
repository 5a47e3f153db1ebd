pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
pub use middleware::auth::{AuthUser, OptionalAuthUser};
pub use models::LikeTarget;
pub use response::{ApiResponse, PaginatedResponse, PaginationQuery};
pub use services::like::{LikeService, LikeToggle};
