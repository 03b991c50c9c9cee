pub mod connections;
pub mod imports;
pub mod oauth;
pub mod sync;
pub mod webhooks;

use axum::http::HeaderMap;
use catsync_core::error::CoreError;

use crate::error::AppError;

/// Header carrying the acting user's identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extract the acting user id, rejecting requests without one.
pub fn require_user_id(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(format!(
                "Missing {USER_ID_HEADER} header"
            )))
        })
}
