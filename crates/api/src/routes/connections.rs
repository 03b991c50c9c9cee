//! Route definitions for platform connections.
//!
//! Mounted at `/connections`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::connections;
use crate::state::AppState;

/// Routes mounted at `/connections`.
///
/// ```text
/// GET    /                  -> list_connections
/// DELETE /{id}              -> delete_connection
/// POST   /{id}/deactivate   -> deactivate_connection
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(connections::list_connections))
        .route("/{id}", delete(connections::delete_connection))
        .route("/{id}/deactivate", post(connections::deactivate_connection))
}
