pub mod admin;
pub mod article;
pub mod auth;
pub mod comment;
pub mod like;
pub mod question;

pub use auth::*;
