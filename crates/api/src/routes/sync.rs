//! Route definitions for product sync.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sync;
use crate::state::AppState;

/// Product sync routes.
///
/// ```text
/// POST /products/{id}/sync         -> sync_product
/// GET  /products/{id}/sync-logs    -> product_sync_logs
/// GET  /products/{id}/mapping      -> product_mapping
/// POST /sync/batch                 -> batch_sync
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/{id}/sync", post(sync::sync_product))
        .route("/products/{id}/sync-logs", get(sync::product_sync_logs))
        .route("/products/{id}/mapping", get(sync::product_mapping))
        .route("/sync/batch", post(sync::batch_sync))
}
