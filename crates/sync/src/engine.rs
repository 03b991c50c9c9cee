//! Single-product synchronization engine.
//!
//! One call pushes one product through the mapping state machine:
//! `syncing` is written before the remote call so a crash mid-flight is
//! observable, and every attempt appends exactly one sync log row, win
//! or lose.

use std::time::Instant;

use async_trait::async_trait;
use catsync_core::error::CoreError;
use catsync_core::platform::{ConnectionConfig, Platform, PlatformCredential};
use catsync_core::sync_status::{LogStatus, SyncOperation, SyncStatus};
use catsync_core::types::DbId;
use catsync_db::models::channel_mapping::UpsertChannelMapping;
use catsync_db::models::connection::PlatformConnection;
use catsync_db::models::sync_log::AppendSyncLog;
use catsync_db::repositories::{ChannelMappingRepo, ConnectionRepo, ProductRepo, SyncLogRepo};
use catsync_db::DbPool;
use catsync_shopify::client::check_user_errors;
use catsync_shopify::graphql::{
    ProductCreateData, ProductDeleteData, ProductMutationPayload, ProductUpdateData,
    PRODUCT_CREATE, PRODUCT_DELETE, PRODUCT_UPDATE,
};
use catsync_shopify::media::StagedMediaUploader;
use catsync_shopify::ShopifyClient;

use crate::error::SyncError;
use crate::transform::{image_urls_to_sync, to_media_inputs, to_product_input};

/// Result of one successful sync attempt.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncOutcome {
    /// External product id after a create/update; `None` after a delete.
    pub external_id: Option<String>,
    /// Remote response snapshot, also persisted in the mapping.
    pub response_data: Option<serde_json::Value>,
    /// Per-image warnings that degraded but did not fail the operation.
    pub warnings: Vec<String>,
}

/// Seam between the engine and its callers (batch coordinator, API).
#[async_trait]
pub trait ProductSync: Send + Sync {
    async fn sync_product(
        &self,
        product_id: DbId,
        operation: SyncOperation,
        connection_id: Option<DbId>,
    ) -> Result<SyncOutcome, SyncError>;
}

/// Decide the mutation to run given the mapping's current external link.
///
/// A repeated `create` on an already-linked product becomes an `update`;
/// the platform must never see a duplicate. An `update` without a link
/// has nothing to address and is rejected.
fn effective_operation(
    requested: SyncOperation,
    linked_id: Option<&str>,
    product_id: DbId,
) -> Result<SyncOperation, SyncError> {
    match (requested, linked_id) {
        (SyncOperation::Create, Some(_)) => Ok(SyncOperation::Update),
        (SyncOperation::Update, None) => Err(SyncError::SyncFailed(format!(
            "product {product_id} has no external id to update"
        ))),
        (op, _) => Ok(op),
    }
}

/// Pushes single products to one platform.
pub struct ProductSyncEngine {
    pool: DbPool,
    platform: Platform,
}

impl ProductSyncEngine {
    pub fn new(pool: DbPool, platform: Platform) -> Self {
        Self { pool, platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve the connection to sync through.
    ///
    /// With an explicit id the connection must exist, be active, and
    /// match the platform; otherwise the most recently connected active
    /// connection (index 0 of the deterministic ordering) is used.
    pub async fn resolve_connection(
        &self,
        connection_id: Option<DbId>,
    ) -> Result<PlatformConnection, SyncError> {
        match connection_id {
            Some(id) => {
                let conn = ConnectionRepo::find_by_id(&self.pool, id)
                    .await?
                    .filter(|c| c.is_active && c.platform == self.platform.as_str())
                    .ok_or(SyncError::NoActiveConnection(self.platform))?;
                Ok(conn)
            }
            None => {
                let mut active = ConnectionRepo::list_active(&self.pool, self.platform).await?;
                if active.is_empty() {
                    return Err(SyncError::NoActiveConnection(self.platform));
                }
                Ok(active.remove(0))
            }
        }
    }

    fn client_for(&self, connection: &PlatformConnection) -> Result<ShopifyClient, SyncError> {
        let credential = connection.credential()?;
        if !credential.is_usable() {
            return Err(SyncError::NoActiveConnection(self.platform));
        }
        let PlatformCredential::Shopify(creds) = credential;
        Ok(ShopifyClient::new(creds.shop_domain, creds.access_token))
    }

    async fn run_create_update(
        &self,
        product_id: DbId,
        operation: SyncOperation,
        connection: &PlatformConnection,
    ) -> Result<SyncOutcome, SyncError> {
        let product = ProductRepo::find_by_id(&self.pool, product_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Product",
                id: product_id,
            })?;

        let config: ConnectionConfig = connection.config();
        let client = self.client_for(connection)?;

        let existing = ChannelMappingRepo::find(&self.pool, product_id, self.platform).await?;
        let linked_id = existing.as_ref().and_then(|m| m.external_id.clone());
        let effective_op = effective_operation(operation, linked_id.as_deref(), product_id)?;

        ChannelMappingRepo::upsert(
            &self.pool,
            product_id,
            self.platform,
            &UpsertChannelMapping::syncing(),
        )
        .await
        .map_err(|e| SyncError::SyncFailed(e.to_string()))?;

        let mut warnings = Vec::new();

        // Inventory quantities need a location; resolve it only when the
        // connection asks for inventory sync.
        let inventory_location = if config.sync_inventory {
            let location = client.primary_location_id().await?;
            if location.is_none() {
                warnings.push("shop has no inventory location; inventory not synced".to_string());
            }
            location
        } else {
            None
        };

        // Stage and upload images before the product mutation. Staging
        // failure aborts; per-image failures degrade to warnings.
        let image_urls = image_urls_to_sync(&product, &config);
        let media = if image_urls.is_empty() {
            Vec::new()
        } else {
            let uploader = StagedMediaUploader::new(&client);
            let outcome = uploader.upload_all(image_urls).await?;
            warnings.extend(outcome.warnings);
            to_media_inputs(&outcome.resource_urls)
        };

        let input = to_product_input(
            &product,
            &config,
            linked_id.as_deref(),
            inventory_location.as_deref(),
        );
        let variables = serde_json::json!({
            "input": input,
            "media": media,
        });

        let payload: ProductMutationPayload = match effective_op {
            SyncOperation::Create => {
                let data: ProductCreateData =
                    client.graphql(PRODUCT_CREATE, variables.clone()).await?;
                data.product_create
            }
            SyncOperation::Update => {
                let data: ProductUpdateData =
                    client.graphql(PRODUCT_UPDATE, variables.clone()).await?;
                data.product_update
            }
            _ => unreachable!("delete handled separately"),
        };

        check_user_errors(&payload.user_errors)?;
        let remote = payload.product.ok_or_else(|| {
            SyncError::SyncFailed("mutation returned neither product nor userErrors".to_string())
        })?;

        let sync_data = serde_json::json!({
            "shop_domain": client.shop_domain(),
            "remote_id": remote.id,
            "handle": remote.handle,
        });

        ChannelMappingRepo::upsert(
            &self.pool,
            product_id,
            self.platform,
            &UpsertChannelMapping {
                external_id: Some(remote.id.clone()),
                external_variant_id: remote.first_variant_id(),
                sync_status: SyncStatus::Success,
                error_message: None,
                sync_data: Some(sync_data.clone()),
            },
        )
        .await
        .map_err(|e| SyncError::SyncFailed(e.to_string()))?;

        Ok(SyncOutcome {
            external_id: Some(remote.id),
            response_data: Some(sync_data),
            warnings,
        })
    }

    async fn run_delete(
        &self,
        product_id: DbId,
        connection: &PlatformConnection,
    ) -> Result<SyncOutcome, SyncError> {
        let client = self.client_for(connection)?;
        let mapping = ChannelMappingRepo::find(&self.pool, product_id, self.platform).await?;

        let mut warnings = Vec::new();
        if let Some(external_id) = mapping.as_ref().and_then(|m| m.external_id.clone()) {
            let variables = serde_json::json!({ "input": { "id": external_id } });
            match client
                .graphql::<ProductDeleteData>(PRODUCT_DELETE, variables)
                .await
            {
                Ok(data) => {
                    // A missing remote record surfaces as a userError;
                    // delete is idempotent, so that still counts as done.
                    if let Err(err) = check_user_errors(&data.product_delete.user_errors) {
                        warnings.push(err.to_string());
                    }
                }
                Err(err) => warnings.push(err.to_string()),
            }
        }

        // Local state reflects removal regardless of the remote outcome.
        ChannelMappingRepo::delete_for_product(&self.pool, product_id, self.platform).await?;

        Ok(SyncOutcome {
            external_id: None,
            response_data: None,
            warnings,
        })
    }

    async fn record_outcome(
        &self,
        product_id: DbId,
        operation: SyncOperation,
        result: &Result<SyncOutcome, SyncError>,
        elapsed_ms: i64,
    ) {
        let (status, message, response_data) = match result {
            Ok(outcome) if outcome.warnings.is_empty() => {
                (LogStatus::Success, None, outcome.response_data.clone())
            }
            Ok(outcome) => (
                LogStatus::Warning,
                Some(outcome.warnings.join("; ")),
                outcome.response_data.clone(),
            ),
            Err(err) => (LogStatus::Error, Some(err.to_string()), None),
        };

        let entry = AppendSyncLog {
            product_id: Some(product_id),
            platform: self.platform.as_str().to_string(),
            operation,
            status,
            message,
            request_data: Some(serde_json::json!({ "operation": operation.as_str() })),
            response_data,
            execution_time_ms: Some(elapsed_ms),
        };
        if let Err(err) = SyncLogRepo::append(&self.pool, &entry).await {
            tracing::error!(product_id, error = %err, "Failed to append sync log row");
        }
    }

    /// Write the terminal `error` mapping state for a failed attempt.
    ///
    /// Best-effort: a product that never existed has no mapping row to
    /// update, and a failure here must not mask the original error.
    async fn record_failure_mapping(&self, product_id: DbId, message: &str) {
        // Failures before the remote call (no connection, staging) may
        // strike while the row still holds a terminal status; bridge
        // through `syncing` so the transition stays legal.
        let bridge = ChannelMappingRepo::upsert(
            &self.pool,
            product_id,
            self.platform,
            &UpsertChannelMapping::syncing(),
        )
        .await;
        if let Err(err) = bridge {
            tracing::warn!(product_id, error = %err, "Could not record error mapping");
            return;
        }
        let result = ChannelMappingRepo::upsert(
            &self.pool,
            product_id,
            self.platform,
            &UpsertChannelMapping {
                external_id: None,
                external_variant_id: None,
                sync_status: SyncStatus::Error,
                error_message: Some(message.to_string()),
                sync_data: None,
            },
        )
        .await;
        if let Err(err) = result {
            tracing::warn!(product_id, error = %err, "Could not record error mapping");
        }
    }
}

#[async_trait]
impl ProductSync for ProductSyncEngine {
    async fn sync_product(
        &self,
        product_id: DbId,
        operation: SyncOperation,
        connection_id: Option<DbId>,
    ) -> Result<SyncOutcome, SyncError> {
        if operation == SyncOperation::BulkImport {
            return Err(SyncError::Core(CoreError::Validation(
                "bulk_import is not a per-product operation".to_string(),
            )));
        }

        let started = Instant::now();

        let result = match self.resolve_connection(connection_id).await {
            Ok(connection) => {
                let result = match operation {
                    SyncOperation::Delete => self.run_delete(product_id, &connection).await,
                    _ => self.run_create_update(product_id, operation, &connection).await,
                };
                if result.is_ok() {
                    // A proven-working connection becomes the default pick.
                    if let Err(err) =
                        ConnectionRepo::touch_last_connected(&self.pool, connection.id).await
                    {
                        tracing::debug!(connection_id = connection.id, error = %err,
                            "Could not bump last_connected");
                    }
                }
                result
            }
            Err(err) => Err(err),
        };

        let elapsed_ms = started.elapsed().as_millis() as i64;

        if let Err(err) = &result {
            self.record_failure_mapping(product_id, &err.to_string()).await;
        }
        self.record_outcome(product_id, operation, &result, elapsed_ms)
            .await;

        match &result {
            Ok(outcome) => tracing::info!(
                product_id,
                operation = operation.as_str(),
                external_id = outcome.external_id.as_deref().unwrap_or(""),
                elapsed_ms,
                "Product sync succeeded"
            ),
            Err(err) => tracing::warn!(
                product_id,
                operation = operation.as_str(),
                error = %err,
                elapsed_ms,
                "Product sync failed"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_without_link_stays_create() {
        let op = effective_operation(SyncOperation::Create, None, 1).unwrap();
        assert_eq!(op, SyncOperation::Create);
    }

    #[test]
    fn test_repeated_create_becomes_update() {
        let op =
            effective_operation(SyncOperation::Create, Some("gid://shopify/Product/9"), 1).unwrap();
        assert_eq!(op, SyncOperation::Update);
    }

    #[test]
    fn test_update_with_link_stays_update() {
        let op =
            effective_operation(SyncOperation::Update, Some("gid://shopify/Product/9"), 1).unwrap();
        assert_eq!(op, SyncOperation::Update);
    }

    #[test]
    fn test_update_without_link_is_rejected() {
        let err = effective_operation(SyncOperation::Update, None, 7).unwrap_err();
        assert!(matches!(err, SyncError::SyncFailed(_)));
        assert!(err.to_string().contains("product 7"));
    }
}
