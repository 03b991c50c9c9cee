pub mod connections;
pub mod health;
pub mod imports;
pub mod oauth;
pub mod sync;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /oauth/shopify/authorize                 begin OAuth (returns URL)
/// /oauth/shopify/callback                  finish OAuth (code exchange)
///
/// /connections                             list active connections
/// /connections/{id}                        delete
/// /connections/{id}/deactivate             soft-disable (POST)
///
/// /products/{id}/sync                      push one product (POST)
/// /products/{id}/sync-logs                 per-product history
/// /products/{id}/mapping                   mapping + admin URL
/// /sync/batch                              push many products (POST)
///
/// /import/start                            begin bulk import (POST)
/// /import/status                           poll status
/// /import/{import_id}/cancel               cancel (POST)
/// /import/clear                            evict finished runs (POST)
///
/// /webhooks/identity                       inbound deliveries (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/oauth", oauth::router())
        .nest("/connections", connections::router())
        .merge(sync::router())
        .nest("/import", imports::router())
        .nest("/webhooks", webhooks::router())
}
