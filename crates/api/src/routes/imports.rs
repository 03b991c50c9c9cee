//! Route definitions for bulk catalog imports.
//!
//! Mounted at `/import`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::imports;
use crate::state::AppState;

/// Routes mounted at `/import`.
///
/// ```text
/// POST /start                  -> start_import
/// GET  /status                 -> import_status
/// POST /{import_id}/cancel     -> cancel_import
/// POST /clear                  -> clear_completed
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(imports::start_import))
        .route("/status", get(imports::import_status))
        .route("/{import_id}/cancel", post(imports::cancel_import))
        .route("/clear", post(imports::clear_completed))
}
