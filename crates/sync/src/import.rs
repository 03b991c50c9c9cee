//! Bulk catalog import orchestrator.
//!
//! One instance per process, constructed at startup and shared through
//! application state. `start_import` returns as soon as the pull is
//! spawned; pollers read progress through `get_status`, which falls back
//! to sync log reconstruction when the in-memory cache has no entry
//! (unknown id, process restart).

use std::collections::HashMap;
use std::sync::Arc;

use catsync_core::import_status::{
    mint_import_id, parse_import_id, reconstruct_from_log, ImportProgress, ImportStatus,
    ImportStatusData, CANCELLED_MESSAGE, MAX_ERROR_SAMPLE, PROGRESS_REFRESH_INTERVAL_SECS,
};
use catsync_core::platform::{Platform, PlatformCredential};
use catsync_core::sync_status::{LogStatus, SyncOperation, SyncStatus};
use catsync_db::models::channel_mapping::UpsertChannelMapping;
use catsync_db::models::connection::PlatformConnection;
use catsync_db::models::product::ImportedProduct;
use catsync_db::models::sync_log::AppendSyncLog;
use catsync_db::repositories::{ChannelMappingRepo, ConnectionRepo, ProductRepo, SyncLogRepo};
use catsync_db::DbPool;
use catsync_shopify::graphql::{ListedProduct, ProductsPageData, PRODUCTS_PAGE};
use catsync_shopify::ShopifyClient;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::SyncError;

/// Page size for the remote catalog listing.
const IMPORT_PAGE_SIZE: usize = 50;

/// One cached import run.
struct ImportEntry {
    data: ImportStatusData,
    cancel: CancellationToken,
}

/// Runs full catalog pulls as detached, pollable background tasks.
///
/// The in-memory map is the only mutable shared state in the core;
/// everything durable lives in the mapping store and sync log, which is
/// also why two processes importing the same connection concurrently is
/// an accepted gap rather than a guarded invariant.
pub struct ImportOrchestrator {
    pool: DbPool,
    platform: Platform,
    entries: RwLock<HashMap<String, ImportEntry>>,
}

impl ImportOrchestrator {
    pub fn new(pool: DbPool, platform: Platform) -> Arc<Self> {
        Arc::new(Self {
            pool,
            platform,
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// Validate the connection, record `pending`, and spawn the pull.
    ///
    /// Returns the minted import id before any remote work happens.
    pub async fn start_import(self: &Arc<Self>) -> Result<String, SyncError> {
        let mut active = ConnectionRepo::list_active(&self.pool, self.platform).await?;
        if active.is_empty() {
            return Err(SyncError::NoActiveConnection(self.platform));
        }
        let connection = active.remove(0);
        let credential = connection.credential()?;
        if !credential.is_usable() {
            return Err(SyncError::NoActiveConnection(self.platform));
        }

        let now = Utc::now();
        let import_id = mint_import_id(self.platform, now);
        let cancel = CancellationToken::new();

        {
            let mut entries = self.entries.write().await;
            entries.insert(
                import_id.clone(),
                ImportEntry {
                    data: ImportStatusData {
                        status: ImportStatus::Pending,
                        progress: None,
                        started_at: Some(now),
                        completed_at: None,
                        error_message: None,
                        last_checked: now,
                    },
                    cancel: cancel.clone(),
                },
            );
        }

        let orchestrator = Arc::clone(self);
        let task_id = import_id.clone();
        tokio::spawn(async move {
            orchestrator.run_import(task_id, connection, cancel).await;
        });

        tracing::info!(import_id = %import_id, "Bulk import started");
        Ok(import_id)
    }

    /// Poll the status of an import.
    ///
    /// A cached active entry is refreshed from the durable stores before
    /// returning (the cache may be stale). An unknown or absent id is
    /// reconstructed best-effort from the latest `bulk_import` log row;
    /// this never fails with "not found".
    pub async fn get_status(&self, import_id: Option<&str>) -> Result<ImportStatusData, SyncError> {
        if let Some(id) = import_id {
            let cached = {
                let entries = self.entries.read().await;
                entries.get(id).map(|e| e.data.clone())
            };
            if let Some(data) = cached {
                if data.status.is_active() {
                    let progress = self.compute_progress().await?;
                    let mut entries = self.entries.write().await;
                    if let Some(entry) = entries.get_mut(id) {
                        if entry.data.status.is_active() {
                            entry.data.progress = Some(progress);
                            entry.data.last_checked = Utc::now();
                        }
                        return Ok(entry.data.clone());
                    }
                }
                return Ok(data);
            }
        }

        let latest = SyncLogRepo::latest_bulk_import(&self.pool, self.platform).await?;
        let view = latest.as_ref().and_then(|row| row.bulk_import_view());
        Ok(reconstruct_from_log(view.as_ref(), Utc::now()))
    }

    /// Cancel a live import. Returns `false` for unknown ids and for
    /// runs that already reached a terminal state.
    ///
    /// Cancellation is cooperative: the record is marked immediately,
    /// and the background task stops at its next check point. In-flight
    /// remote calls are not aborted.
    pub async fn cancel_import(&self, import_id: &str) -> bool {
        // An id minted for another platform (or not minted at all) can
        // never name one of our runs.
        match parse_import_id(import_id) {
            Some((platform, _)) if platform == self.platform => {}
            _ => return false,
        }
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(import_id) else {
            return false;
        };
        if !entry.data.status.is_active() {
            return false;
        }
        entry.data.status = ImportStatus::Error;
        entry.data.error_message = Some(CANCELLED_MESSAGE.to_string());
        entry.data.completed_at = Some(Utc::now());
        entry.cancel.cancel();
        tracing::info!(import_id = %import_id, "Bulk import cancelled");
        true
    }

    /// Evict terminal entries so a fresh poll reports `idle`.
    pub async fn clear_completed(&self) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.data.status.is_active());
    }

    // ---- background task ----

    async fn run_import(
        self: Arc<Self>,
        import_id: String,
        connection: PlatformConnection,
        cancel: CancellationToken,
    ) {
        if !self.try_transition(&import_id, ImportStatus::Importing).await {
            // Cancelled between spawn and start.
            return;
        }

        // Periodic progress refresh while the pull runs.
        let ticker_cancel = cancel.child_token();
        let ticker = {
            let orchestrator = Arc::clone(&self);
            let id = import_id.clone();
            let token = ticker_cancel.clone();
            tokio::spawn(async move {
                let period = std::time::Duration::from_secs(PROGRESS_REFRESH_INTERVAL_SECS);
                let mut interval = tokio::time::interval(period);
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = interval.tick() => {
                            if let Ok(progress) = orchestrator.compute_progress().await {
                                orchestrator.set_progress(&id, progress).await;
                            }
                        }
                    }
                }
            })
        };

        let result = self.pull_catalog(&connection, &cancel).await;

        ticker_cancel.cancel();
        let _ = ticker.await;

        match result {
            Ok(summary) if cancel.is_cancelled() => {
                // cancel_import already wrote the terminal record; only
                // the audit row is left to write.
                self.append_import_log(
                    LogStatus::Error,
                    CANCELLED_MESSAGE.to_string(),
                    summary.imported,
                    summary.total,
                )
                .await;
            }
            Ok(summary) => {
                let status = if summary.errors.is_empty() {
                    LogStatus::Success
                } else {
                    LogStatus::Warning
                };
                let message = format!("imported {} of {} products", summary.imported, summary.total);
                self.append_import_log(status, message.clone(), summary.imported, summary.total)
                    .await;
                self.finish(&import_id, ImportStatus::Completed, None, summary)
                    .await;
            }
            Err(err) => {
                let message = err.to_string();
                self.append_import_log(LogStatus::Error, message.clone(), 0, 0)
                    .await;
                self.finish(
                    &import_id,
                    ImportStatus::Error,
                    Some(message),
                    PullSummary::default(),
                )
                .await;
            }
        }
    }

    /// Page through the remote catalog, upserting every product.
    ///
    /// Individual product failures are tolerated and sampled; only a
    /// listing failure is fatal. The cancellation token is checked
    /// between pages, never mid-call.
    async fn pull_catalog(
        &self,
        connection: &PlatformConnection,
        cancel: &CancellationToken,
    ) -> Result<PullSummary, SyncError> {
        let credential = connection.credential()?;
        let PlatformCredential::Shopify(creds) = credential;
        let client = ShopifyClient::new(creds.shop_domain.clone(), creds.access_token);

        let mut summary = PullSummary::default();
        let mut cursor: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let variables = serde_json::json!({
                "first": IMPORT_PAGE_SIZE,
                "after": cursor,
            });
            let page: ProductsPageData = client.graphql(PRODUCTS_PAGE, variables).await?;

            for edge in &page.products.edges {
                summary.total += 1;
                match self.upsert_remote_product(&edge.node, &creds.shop_domain).await {
                    Ok(()) => summary.imported += 1,
                    Err(err) => {
                        if summary.errors.len() < MAX_ERROR_SAMPLE {
                            summary
                                .errors
                                .push(format!("{}: {err}", edge.node.title));
                        }
                        tracing::warn!(
                            remote_id = %edge.node.id,
                            error = %err,
                            "Skipping product during bulk import"
                        );
                    }
                }
            }

            if !page.products.page_info.has_next_page {
                break;
            }
            cursor = page.products.page_info.end_cursor.clone();
        }

        Ok(summary)
    }

    /// Upsert one remote product and its channel mapping.
    async fn upsert_remote_product(
        &self,
        remote: &ListedProduct,
        shop_domain: &str,
    ) -> Result<(), SyncError> {
        let variant = remote.first_variant();
        let imported = ImportedProduct {
            title: remote.title.clone(),
            description: remote.description_html.clone(),
            vendor: remote.vendor.clone(),
            product_type: remote.product_type.clone(),
            tags: remote.tags.clone(),
            status: if remote.status.eq_ignore_ascii_case("active") {
                "active".to_string()
            } else {
                "draft".to_string()
            },
            price: variant.and_then(|v| v.price.clone()),
            sku: variant.and_then(|v| v.sku.clone()),
            inventory_count: variant.and_then(|v| v.inventory_quantity).unwrap_or(0),
            image_urls: remote.image_urls(),
            external_source: format!("{}:{}", self.platform.as_str(), remote.id),
        };

        let product = ProductRepo::upsert_imported(&self.pool, &imported).await?;

        let sync_data = serde_json::json!({
            "shop_domain": shop_domain,
            "remote_id": remote.id,
            "source": "bulk_import",
        });
        // Bridge through `syncing` so a previously errored mapping can
        // legally reach `success`.
        ChannelMappingRepo::upsert(
            &self.pool,
            product.id,
            self.platform,
            &UpsertChannelMapping::syncing(),
        )
        .await
        .map_err(|e| SyncError::SyncFailed(e.to_string()))?;
        ChannelMappingRepo::upsert(
            &self.pool,
            product.id,
            self.platform,
            &UpsertChannelMapping {
                external_id: Some(remote.id.clone()),
                external_variant_id: variant.map(|v| v.id.clone()),
                sync_status: SyncStatus::Success,
                error_message: None,
                sync_data: Some(sync_data),
            },
        )
        .await
        .map_err(|e| SyncError::SyncFailed(e.to_string()))?;

        Ok(())
    }

    // ---- status bookkeeping ----

    /// Recompute live counts from the durable stores.
    async fn compute_progress(&self) -> Result<ImportProgress, SyncError> {
        let imported =
            ChannelMappingRepo::count_by_status(&self.pool, self.platform, SyncStatus::Success)
                .await?;
        let total = ProductRepo::count(&self.pool).await?;
        let errors =
            ChannelMappingRepo::recent_errors(&self.pool, self.platform, MAX_ERROR_SAMPLE as i64)
                .await?;
        Ok(ImportProgress {
            imported: imported.max(0) as u64,
            total: total.max(0) as u64,
            errors,
            current_operation: Some("importing products".to_string()),
        })
    }

    async fn set_progress(&self, import_id: &str, progress: ImportProgress) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(import_id) {
            if entry.data.status.is_active() {
                entry.data.progress = Some(progress);
                entry.data.last_checked = Utc::now();
            }
        }
    }

    /// Advance an active entry, refusing illegal moves (e.g. a write
    /// racing a cancellation). Returns whether the transition applied.
    async fn try_transition(&self, import_id: &str, next: ImportStatus) -> bool {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(import_id) else {
            return false;
        };
        if !entry.data.status.can_transition_to(next) {
            return false;
        }
        entry.data.status = next;
        entry.data.last_checked = Utc::now();
        true
    }

    /// Single terminal write for the background task.
    async fn finish(
        &self,
        import_id: &str,
        status: ImportStatus,
        error_message: Option<String>,
        summary: PullSummary,
    ) {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(import_id) else {
            return;
        };
        if !entry.data.status.is_active() {
            // Cancellation already wrote the terminal record.
            return;
        }
        entry.data.status = status;
        entry.data.error_message = error_message;
        entry.data.completed_at = Some(Utc::now());
        entry.data.last_checked = Utc::now();
        let mut progress = ImportProgress {
            imported: summary.imported,
            total: summary.total,
            errors: summary.errors,
            current_operation: None,
        };
        progress.truncate_errors();
        entry.data.progress = Some(progress);

        tracing::info!(
            import_id = %import_id,
            status = entry.data.status.as_str(),
            imported = progress_count(&entry.data),
            "Bulk import finished"
        );
    }

    /// One audit row per import run, win or lose.
    async fn append_import_log(&self, status: LogStatus, message: String, imported: u64, total: u64) {
        let entry = AppendSyncLog {
            product_id: None,
            platform: self.platform.as_str().to_string(),
            operation: SyncOperation::BulkImport,
            status,
            message: Some(message),
            request_data: None,
            response_data: Some(serde_json::json!({
                "imported": imported,
                "total": total,
            })),
            execution_time_ms: None,
        };
        if let Err(err) = SyncLogRepo::append(&self.pool, &entry).await {
            tracing::error!(error = %err, "Failed to append bulk import log row");
        }
    }

    #[cfg(test)]
    async fn insert_entry_for_test(&self, import_id: &str, status: ImportStatus) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.insert(
            import_id.to_string(),
            ImportEntry {
                data: ImportStatusData {
                    status,
                    progress: None,
                    started_at: Some(now),
                    completed_at: None,
                    error_message: None,
                    last_checked: now,
                },
                cancel: CancellationToken::new(),
            },
        );
    }
}

fn progress_count(data: &ImportStatusData) -> u64 {
    data.progress.as_ref().map(|p| p.imported).unwrap_or(0)
}

/// Accumulated result of one catalog pull.
#[derive(Debug, Default)]
struct PullSummary {
    imported: u64,
    total: u64,
    errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool() -> DbPool {
        // Never connected; these tests only touch the in-memory cache.
        DbPool::connect_lazy("postgres://localhost/catsync_test").unwrap()
    }

    #[tokio::test]
    async fn test_cancel_unknown_id_is_false() {
        let orchestrator = ImportOrchestrator::new(lazy_pool(), Platform::Shopify);
        assert!(!orchestrator.cancel_import("shopify-123").await);
    }

    #[tokio::test]
    async fn test_cancel_foreign_or_malformed_id_is_false() {
        let orchestrator = ImportOrchestrator::new(lazy_pool(), Platform::Shopify);
        assert!(!orchestrator.cancel_import("not-an-import-id").await);
        assert!(!orchestrator.cancel_import("shopify").await);
    }

    #[tokio::test]
    async fn test_cancel_active_import() {
        let orchestrator = ImportOrchestrator::new(lazy_pool(), Platform::Shopify);
        orchestrator
            .insert_entry_for_test("shopify-1", ImportStatus::Importing)
            .await;

        assert!(orchestrator.cancel_import("shopify-1").await);

        let data = orchestrator.get_status(Some("shopify-1")).await.unwrap();
        assert_eq!(data.status, ImportStatus::Error);
        assert_eq!(data.error_message.as_deref(), Some(CANCELLED_MESSAGE));
    }

    #[tokio::test]
    async fn test_cancel_completed_import_is_false_and_unchanged() {
        let orchestrator = ImportOrchestrator::new(lazy_pool(), Platform::Shopify);
        orchestrator
            .insert_entry_for_test("shopify-2", ImportStatus::Completed)
            .await;

        assert!(!orchestrator.cancel_import("shopify-2").await);

        let data = orchestrator.get_status(Some("shopify-2")).await.unwrap();
        assert_eq!(data.status, ImportStatus::Completed);
        assert!(data.error_message.is_none());
    }

    #[tokio::test]
    async fn test_clear_completed_evicts_terminal_entries() {
        let orchestrator = ImportOrchestrator::new(lazy_pool(), Platform::Shopify);
        orchestrator
            .insert_entry_for_test("shopify-3", ImportStatus::Completed)
            .await;
        orchestrator
            .insert_entry_for_test("shopify-4", ImportStatus::Importing)
            .await;

        orchestrator.clear_completed().await;

        let entries = orchestrator.entries.read().await;
        assert!(!entries.contains_key("shopify-3"));
        assert!(entries.contains_key("shopify-4"));
    }

    #[tokio::test]
    async fn test_double_cancel_is_false() {
        let orchestrator = ImportOrchestrator::new(lazy_pool(), Platform::Shopify);
        orchestrator
            .insert_entry_for_test("shopify-5", ImportStatus::Pending)
            .await;

        assert!(orchestrator.cancel_import("shopify-5").await);
        assert!(!orchestrator.cancel_import("shopify-5").await);
    }
}
