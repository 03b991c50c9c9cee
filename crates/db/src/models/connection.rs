//! Models for platform connections.

use catsync_core::error::CoreError;
use catsync_core::platform::{ConnectionConfig, Platform, PlatformCredential};
use catsync_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `platform_connections` table.
///
/// `credentials` stays an opaque JSONB blob at the row level; decode it
/// with [`PlatformConnection::credential`] at the point of use so the
/// typed union never round-trips through handler code.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlatformConnection {
    pub id: DbId,
    pub user_id: String,
    pub platform: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub credentials: serde_json::Value,
    pub configuration: Option<serde_json::Value>,
    pub is_active: bool,
    pub last_connected: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PlatformConnection {
    /// Decode the credential blob into the typed union.
    pub fn credential(&self) -> Result<PlatformCredential, CoreError> {
        PlatformCredential::from_json(&self.credentials)
    }

    /// Decode the configuration blob, defaulting missing flags.
    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig::from_json(self.configuration.as_ref())
    }

    pub fn platform_enum(&self) -> Result<Platform, CoreError> {
        Platform::parse(&self.platform)
    }
}

/// DTO for upserting a connection at the end of an OAuth exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertConnection {
    pub user_id: String,
    pub platform: Platform,
    pub display_name: String,
    pub credentials: serde_json::Value,
    pub configuration: Option<serde_json::Value>,
}
