//! Handlers for the OAuth credential exchange.
//!
//! The state token is right-anchored (`{identity}-{unix_millis}`): the
//! identity may itself contain the separator, so both minting and the
//! callback split at the last `-` only.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use catsync_core::oauth_state::{mint_state, validate_state};
use catsync_core::platform::{Platform, PlatformCredential, ShopifyCredentials};
use catsync_db::models::connection::{PlatformConnection, UpsertConnection};
use catsync_db::repositories::ConnectionRepo;
use catsync_shopify::oauth::validate_shop_domain;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::require_user_id;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the authorize endpoint.
#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    /// Fully qualified shop domain, e.g. `my-store.myshopify.com`.
    pub shop: String,
}

/// Typed response for the authorize endpoint.
#[derive(Debug, Serialize)]
pub struct AuthorizeResult {
    pub authorize_url: String,
    pub state: String,
}

/// GET /api/v1/oauth/shopify/authorize
///
/// Mint a fresh state token bound to the acting user and return the
/// platform authorize URL to redirect the browser to.
pub async fn begin_authorization(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AuthorizeParams>,
) -> AppResult<Json<DataResponse<AuthorizeResult>>> {
    let user_id = require_user_id(&headers)?;
    validate_shop_domain(&params.shop)?;

    let state_token = mint_state(user_id, chrono::Utc::now());
    let authorize_url = state.oauth.build_authorize_url(&params.shop, &state_token);

    tracing::info!(user_id = %user_id, shop = %params.shop, "OAuth authorization started");

    Ok(Json(DataResponse {
        data: AuthorizeResult {
            authorize_url,
            state: state_token,
        },
    }))
}

/// Query parameters for the callback endpoint.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
    pub shop: String,
    pub state: String,
}

/// GET /api/v1/oauth/shopify/callback
///
/// Validate the returned state, exchange the authorization code for an
/// access token (with connectivity probe), and upsert the connection.
/// Reconnecting an existing shop refreshes its credentials in place.
pub async fn oauth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> AppResult<Json<DataResponse<PlatformConnection>>> {
    let user_id = require_user_id(&headers)?;
    validate_state(&params.state, user_id, chrono::Utc::now())?;

    let (token, shop_info) = state
        .oauth
        .exchange_code_for_token(&params.shop, &params.code)
        .await?;

    let credential = PlatformCredential::Shopify(ShopifyCredentials {
        access_token: token.access_token,
        shop_domain: params.shop.clone(),
        scope: token.scope,
    });

    let connection = ConnectionRepo::upsert(
        &state.pool,
        &UpsertConnection {
            user_id: user_id.to_string(),
            platform: Platform::Shopify,
            display_name: shop_info.name.clone(),
            credentials: credential.to_json(),
            configuration: None,
        },
    )
    .await?;

    tracing::info!(
        user_id = %user_id,
        shop = %params.shop,
        connection_id = connection.id,
        token = %credential.redacted_token(),
        "Connection established"
    );

    Ok(Json(DataResponse { data: connection }))
}
