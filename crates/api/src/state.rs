use std::sync::Arc;

use catsync_shopify::oauth::ShopifyOAuth;
use catsync_sync::{ImportOrchestrator, ProductSyncEngine};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: catsync_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// OAuth exchange for the configured app.
    pub oauth: Arc<ShopifyOAuth>,
    /// Single-product sync engine.
    pub engine: Arc<ProductSyncEngine>,
    /// Bulk import orchestrator (detached background pulls).
    pub orchestrator: Arc<ImportOrchestrator>,
}
