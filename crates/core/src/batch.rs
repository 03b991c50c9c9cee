//! Batch sync arithmetic, limits, and result aggregation.
//!
//! Pure functions and types shared by the batch coordinator and the API
//! layer. Concurrency itself lives in `catsync-sync`; this module only
//! knows the numbers.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Minimum number of product ids per batch call.
pub const MIN_BATCH_ITEMS: usize = 1;

/// Maximum number of product ids per batch call.
pub const MAX_BATCH_ITEMS: usize = 50;

/// Smallest allowed chunk size (concurrent in-flight syncs).
pub const MIN_BATCH_SIZE: usize = 1;

/// Largest allowed chunk size.
pub const MAX_BATCH_SIZE: usize = 10;

/// Default chunk size when the caller does not specify one.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Validate the id list length against the batch limits.
pub fn validate_batch_items(ids: &[DbId]) -> Result<(), CoreError> {
    if ids.len() < MIN_BATCH_ITEMS {
        return Err(CoreError::Validation(
            "Batch sync requires at least one product id".to_string(),
        ));
    }
    if ids.len() > MAX_BATCH_ITEMS {
        return Err(CoreError::Validation(format!(
            "Batch sync accepts at most {MAX_BATCH_ITEMS} product ids, got {}",
            ids.len()
        )));
    }
    Ok(())
}

/// Clamp a requested chunk size into the allowed range.
pub fn clamp_batch_size(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_BATCH_SIZE)
        .clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE)
}

// ---------------------------------------------------------------------------
// Result aggregation
// ---------------------------------------------------------------------------

/// One failed item in a batch, keyed by its product id.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemError {
    pub product_id: DbId,
    pub message: String,
}

/// Aggregated outcome of one batch sync call.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<BatchItemError>,
    pub processing_time_ms: u64,
}

// Hand-written so the payload carries `success_rate`; callers should
// not have to re-derive it from the counts.
impl Serialize for BatchReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BatchReport", 6)?;
        state.serialize_field("total_processed", &self.total_processed)?;
        state.serialize_field("successful", &self.successful)?;
        state.serialize_field("failed", &self.failed)?;
        state.serialize_field("success_rate", &self.success_rate())?;
        state.serialize_field("errors", &self.errors)?;
        state.serialize_field("processing_time_ms", &self.processing_time_ms)?;
        state.end()
    }
}

impl BatchReport {
    pub fn record_success(&mut self) {
        self.total_processed += 1;
        self.successful += 1;
    }

    pub fn record_failure(&mut self, product_id: DbId, message: String) {
        self.total_processed += 1;
        self.failed += 1;
        self.errors.push(BatchItemError {
            product_id,
            message,
        });
    }

    /// Integer success percentage over processed items (0 when empty).
    pub fn success_rate(&self) -> u8 {
        if self.total_processed == 0 {
            return 0;
        }
        let pct = (self.successful as f64 / self.total_processed as f64) * 100.0;
        pct.round().clamp(0.0, 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_batch_items() {
        assert!(validate_batch_items(&[]).is_err());
        assert!(validate_batch_items(&[1]).is_ok());
        let fifty: Vec<DbId> = (1..=50).collect();
        assert!(validate_batch_items(&fifty).is_ok());
        let fifty_one: Vec<DbId> = (1..=51).collect();
        assert!(validate_batch_items(&fifty_one).is_err());
    }

    #[test]
    fn test_clamp_batch_size() {
        assert_eq!(clamp_batch_size(None), DEFAULT_BATCH_SIZE);
        assert_eq!(clamp_batch_size(Some(0)), MIN_BATCH_SIZE);
        assert_eq!(clamp_batch_size(Some(3)), 3);
        assert_eq!(clamp_batch_size(Some(100)), MAX_BATCH_SIZE);
    }

    #[test]
    fn test_report_counts_and_rate() {
        let mut report = BatchReport::default();
        for _ in 0..47 {
            report.record_success();
        }
        for id in [3, 17, 42] {
            report.record_failure(id, "simulated failure".into());
        }
        assert_eq!(report.total_processed, 50);
        assert_eq!(report.successful, 47);
        assert_eq!(report.failed, 3);
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.success_rate(), 94);
        assert!(report.errors.iter().any(|e| e.product_id == 17));
    }

    #[test]
    fn test_empty_report_rate_is_zero() {
        assert_eq!(BatchReport::default().success_rate(), 0);
    }

    #[test]
    fn test_report_serializes_success_rate() {
        let mut report = BatchReport::default();
        for _ in 0..3 {
            report.record_success();
        }
        report.record_failure(9, "simulated failure".into());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success_rate"], 75);
        assert_eq!(json["total_processed"], 4);
        assert_eq!(json["errors"][0]["product_id"], 9);
    }
}
