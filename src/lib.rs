pub mod api;
pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod ws;

pub use api::middleware::{ApiError, ApiResult, AppState};
pub use config::Config;
pub use database::Database;
