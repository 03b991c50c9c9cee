//! Route definitions for the OAuth credential exchange.
//!
//! Mounted at `/oauth`.

use axum::routing::get;
use axum::Router;

use crate::handlers::oauth;
use crate::state::AppState;

/// Routes mounted at `/oauth`.
///
/// ```text
/// GET /shopify/authorize   -> begin_authorization
/// GET /shopify/callback    -> oauth_callback
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shopify/authorize", get(oauth::begin_authorization))
        .route("/shopify/callback", get(oauth::oauth_callback))
}
