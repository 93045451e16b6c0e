pub mod auth;
pub mod error;

pub use auth::{require_auth, AppState};
pub use error::{ApiError, ApiResult};
