//! Models for channel mappings (local product ↔ external identity).

use catsync_core::error::CoreError;
use catsync_core::sync_status::SyncStatus;
use catsync_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `channel_mappings` table.
///
/// The single source of truth for "is this product linked, and how".
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChannelMapping {
    pub id: DbId,
    pub product_id: DbId,
    pub platform: String,
    pub external_id: Option<String>,
    pub external_variant_id: Option<String>,
    pub sync_status: String,
    pub last_synced: Option<Timestamp>,
    pub error_message: Option<String>,
    pub error_count: i32,
    /// Snapshot of the last successful remote response, for diagnostics
    /// and admin URL derivation.
    pub sync_data: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ChannelMapping {
    pub fn status(&self) -> Result<SyncStatus, CoreError> {
        SyncStatus::parse(&self.sync_status)
    }

    /// Derive the platform admin URL for the linked product, when the
    /// sync_data snapshot carries a shop domain and the mapping is linked.
    pub fn admin_url(&self) -> Option<String> {
        let external_id = self.external_id.as_deref()?;
        let shop = self
            .sync_data
            .as_ref()?
            .get("shop_domain")?
            .as_str()?
            .to_string();
        // GraphQL ids look like gid://shopify/Product/123; admin URLs use
        // the trailing numeric part.
        let numeric = external_id.rsplit('/').next().unwrap_or(external_id);
        Some(format!("https://{shop}/admin/products/{numeric}"))
    }
}

/// DTO for the idempotent mapping upsert.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertChannelMapping {
    pub external_id: Option<String>,
    pub external_variant_id: Option<String>,
    pub sync_status: SyncStatus,
    pub error_message: Option<String>,
    pub sync_data: Option<serde_json::Value>,
}

impl UpsertChannelMapping {
    /// Shorthand for the pre-flight `syncing` write.
    pub fn syncing() -> Self {
        Self {
            external_id: None,
            external_variant_id: None,
            sync_status: SyncStatus::Syncing,
            error_message: None,
            sync_data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mapping(external_id: Option<&str>, sync_data: Option<serde_json::Value>) -> ChannelMapping {
        ChannelMapping {
            id: 1,
            product_id: 10,
            platform: "shopify".into(),
            external_id: external_id.map(String::from),
            external_variant_id: None,
            sync_status: "success".into(),
            last_synced: None,
            error_message: None,
            error_count: 0,
            sync_data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_url_from_graphql_id() {
        let m = mapping(
            Some("gid://shopify/Product/123456"),
            Some(serde_json::json!({"shop_domain": "demo.myshopify.com"})),
        );
        assert_eq!(
            m.admin_url().unwrap(),
            "https://demo.myshopify.com/admin/products/123456"
        );
    }

    #[test]
    fn test_admin_url_requires_link_and_snapshot() {
        assert!(mapping(None, None).admin_url().is_none());
        assert!(mapping(Some("gid://shopify/Product/1"), None)
            .admin_url()
            .is_none());
    }
}
