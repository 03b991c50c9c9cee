//! Bounded-concurrency batch synchronization.

use std::sync::Arc;
use std::time::Instant;

use catsync_core::batch::{clamp_batch_size, validate_batch_items, BatchReport};
use catsync_core::error::CoreError;
use catsync_core::sync_status::SyncOperation;
use catsync_core::types::DbId;
use futures::future::join_all;

use crate::engine::ProductSync;

/// Fans product ids into chunks and drives the engine per item.
pub struct BatchSyncCoordinator<S: ProductSync> {
    engine: Arc<S>,
}

impl<S: ProductSync> BatchSyncCoordinator<S> {
    pub fn new(engine: Arc<S>) -> Self {
        Self { engine }
    }

    /// Sync up to 50 products with at most `batch_size` (1..=10,
    /// clamped) in flight at once.
    ///
    /// Chunks run strictly in sequence: chunk N+1 does not start before
    /// every item of chunk N has settled. Within a chunk there is no
    /// ordering guarantee. A single item's failure never aborts the
    /// batch; it lands in the report's `errors` keyed by product id.
    pub async fn sync_many(
        &self,
        product_ids: &[DbId],
        operation: SyncOperation,
        connection_id: Option<DbId>,
        batch_size: Option<usize>,
    ) -> Result<BatchReport, CoreError> {
        validate_batch_items(product_ids)?;
        if operation == SyncOperation::BulkImport {
            return Err(CoreError::Validation(
                "bulk_import is not a batch operation".to_string(),
            ));
        }
        let chunk_size = clamp_batch_size(batch_size);

        let started = Instant::now();
        let mut report = BatchReport::default();

        for chunk in product_ids.chunks(chunk_size) {
            let futures = chunk.iter().map(|&product_id| {
                let engine = Arc::clone(&self.engine);
                async move {
                    let result = engine
                        .sync_product(product_id, operation, connection_id)
                        .await;
                    (product_id, result)
                }
            });

            for (product_id, result) in join_all(futures).await {
                match result {
                    Ok(_) => report.record_success(),
                    Err(err) => report.record_failure(product_id, err.to_string()),
                }
            }
        }

        report.processing_time_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            total = report.total_processed,
            successful = report.successful,
            failed = report.failed,
            success_rate = report.success_rate(),
            elapsed_ms = report.processing_time_ms,
            "Batch sync settled"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catsync_core::platform::Platform;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::engine::SyncOutcome;
    use crate::error::SyncError;

    /// Stub engine: fails a fixed id set, tracks peak concurrency.
    struct StubEngine {
        failing_ids: Vec<DbId>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl StubEngine {
        fn failing(ids: &[DbId]) -> Self {
            Self {
                failing_ids: ids.to_vec(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProductSync for StubEngine {
        async fn sync_product(
            &self,
            product_id: DbId,
            _operation: SyncOperation,
            _connection_id: Option<DbId>,
        ) -> Result<SyncOutcome, SyncError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing_ids.contains(&product_id) {
                Err(SyncError::NoActiveConnection(Platform::Shopify))
            } else {
                Ok(SyncOutcome {
                    external_id: Some(format!("gid://shopify/Product/{product_id}")),
                    response_data: None,
                    warnings: Vec::new(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_fifty_ids_three_failures() {
        let engine = Arc::new(StubEngine::failing(&[3, 17, 42]));
        let coordinator = BatchSyncCoordinator::new(Arc::clone(&engine));
        let ids: Vec<DbId> = (1..=50).collect();

        let report = coordinator
            .sync_many(&ids, SyncOperation::Update, None, Some(5))
            .await
            .unwrap();

        assert_eq!(report.total_processed, 50);
        assert_eq!(report.successful, 47);
        assert_eq!(report.failed, 3);
        assert_eq!(report.success_rate(), 94);
        let failed_ids: Vec<DbId> = report.errors.iter().map(|e| e.product_id).collect();
        assert_eq!(failed_ids.len(), 3);
        for id in [3, 17, 42] {
            assert!(failed_ids.contains(&id), "missing failure for id {id}");
        }
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_chunk_size() {
        let engine = Arc::new(StubEngine::failing(&[]));
        let coordinator = BatchSyncCoordinator::new(Arc::clone(&engine));
        let ids: Vec<DbId> = (1..=20).collect();

        coordinator
            .sync_many(&ids, SyncOperation::Update, None, Some(4))
            .await
            .unwrap();

        assert!(engine.peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_input_limits_enforced() {
        let engine = Arc::new(StubEngine::failing(&[]));
        let coordinator = BatchSyncCoordinator::new(engine);

        assert!(coordinator
            .sync_many(&[], SyncOperation::Update, None, None)
            .await
            .is_err());

        let too_many: Vec<DbId> = (1..=51).collect();
        assert!(coordinator
            .sync_many(&too_many, SyncOperation::Update, None, None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_bulk_import_rejected() {
        let engine = Arc::new(StubEngine::failing(&[]));
        let coordinator = BatchSyncCoordinator::new(engine);
        assert!(coordinator
            .sync_many(&[1], SyncOperation::BulkImport, None, None)
            .await
            .is_err());
    }
}
