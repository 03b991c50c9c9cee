//! Handlers for platform connection management.
//!
//! The credential blob never leaves the server: `PlatformConnection`
//! skips it during serialization.

use axum::extract::{Path, Query, State};
use axum::Json;
use catsync_core::error::CoreError;
use catsync_core::platform::Platform;
use catsync_core::types::DbId;
use catsync_db::models::connection::PlatformConnection;
use catsync_db::repositories::ConnectionRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the connection list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Platform filter; defaults to `shopify`.
    pub platform: Option<Platform>,
}

/// GET /api/v1/connections
///
/// Active connections for a platform, most recently connected first.
pub async fn list_connections(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<DataResponse<Vec<PlatformConnection>>>> {
    let platform = params.platform.unwrap_or(Platform::Shopify);
    let connections = ConnectionRepo::list_active(&state.pool, platform).await?;
    Ok(Json(DataResponse { data: connections }))
}

/// DELETE /api/v1/connections/{id}
///
/// Remove a connection and its stored credentials.
pub async fn delete_connection(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let deleted = ConnectionRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(CoreError::NotFound {
            entity: "connection",
            id,
        }
        .into());
    }
    tracing::info!(connection_id = id, "Connection deleted");
    Ok(Json(DataResponse {
        data: serde_json::json!({ "deleted": true }),
    }))
}

/// POST /api/v1/connections/{id}/deactivate
///
/// Soft-disable a connection without dropping its credentials; a later
/// OAuth reconnect reactivates it.
pub async fn deactivate_connection(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let deactivated = ConnectionRepo::deactivate(&state.pool, id).await?;
    if !deactivated {
        return Err(CoreError::NotFound {
            entity: "connection",
            id,
        }
        .into());
    }
    tracing::info!(connection_id = id, "Connection deactivated");
    Ok(Json(DataResponse {
        data: serde_json::json!({ "deactivated": true }),
    }))
}
