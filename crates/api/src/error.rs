use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catsync_core::error::CoreError;
use catsync_db::repositories::MappingStoreError;
use catsync_shopify::oauth::ExchangeError;
use catsync_sync::SyncError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors, [`SyncError`] for engine
/// failures, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `catsync_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A sync engine or import failure.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A failed OAuth credential exchange.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<MappingStoreError> for AppError {
    fn from(err: MappingStoreError) -> Self {
        match err {
            MappingStoreError::Database(e) => AppError::Database(e),
            MappingStoreError::Transition(e) => AppError::Core(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Sync(sync) => match sync {
                SyncError::NoActiveConnection(platform) => (
                    StatusCode::BAD_REQUEST,
                    "NO_ACTIVE_CONNECTION",
                    format!("No active {platform} connection"),
                ),
                SyncError::RemoteValidation(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "REMOTE_VALIDATION",
                    msg.clone(),
                ),
                SyncError::StagingFailed(msg) => {
                    (StatusCode::BAD_GATEWAY, "STAGING_FAILED", msg.clone())
                }
                SyncError::SyncFailed(msg) => {
                    (StatusCode::BAD_GATEWAY, "SYNC_FAILED", msg.clone())
                }
                SyncError::Core(core) => classify_core_error(core),
                SyncError::Database(err) => classify_sqlx_error(err),
            },

            AppError::Exchange(exchange) => match exchange {
                ExchangeError::InvalidShopDomain(domain) => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_SHOP_DOMAIN",
                    format!("Invalid shop domain: '{domain}'"),
                ),
                ExchangeError::TokenExchangeFailed { status, .. } => (
                    StatusCode::BAD_GATEWAY,
                    "TOKEN_EXCHANGE_FAILED",
                    format!("Authorization code exchange failed (upstream status {status})"),
                ),
                ExchangeError::ConnectionTestFailed(msg) => (
                    StatusCode::BAD_GATEWAY,
                    "CONNECTION_TEST_FAILED",
                    msg.clone(),
                ),
                ExchangeError::Request(err) => {
                    tracing::error!(error = %err, "OAuth request error");
                    (
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_ERROR",
                        "Upstream request failed".to_string(),
                    )
                }
            },

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::NoActiveConnection(platform) => (
            StatusCode::BAD_REQUEST,
            "NO_ACTIVE_CONNECTION",
            format!("No active {platform} connection"),
        ),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
