//! Bulk import status machine and poll payloads.
//!
//! The orchestrator owns a process-local cache of [`ImportStatusData`];
//! when the cache has no entry (fresh process, unknown id) status is
//! reconstructed best-effort from the durable sync log via
//! [`reconstruct_from_log`].

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::platform::Platform;
use crate::sync_status::LogStatus;
use crate::types::Timestamp;

/// Maximum number of error messages carried in a progress sample.
pub const MAX_ERROR_SAMPLE: usize = 5;

/// How often the background task refreshes progress counts, in seconds.
pub const PROGRESS_REFRESH_INTERVAL_SECS: u64 = 2;

/// Caller-side liveness guard: pollers should declare an import timed out
/// after this many seconds without a status change. The orchestrator
/// itself does not enforce it.
pub const IMPORT_STALL_TIMEOUT_SECS: u64 = 300;

/// Message recorded when a user cancels an import.
pub const CANCELLED_MESSAGE: &str = "cancelled by user";

// ---------------------------------------------------------------------------
// Status machine
// ---------------------------------------------------------------------------

/// Lifecycle of one bulk import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Idle,
    Pending,
    Importing,
    Completed,
    Error,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Idle => "idle",
            ImportStatus::Pending => "pending",
            ImportStatus::Importing => "importing",
            ImportStatus::Completed => "completed",
            ImportStatus::Error => "error",
        }
    }

    /// Whether the run has reached a state it can never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportStatus::Completed | ImportStatus::Error)
    }

    /// Whether the run is still live (cancellable, refreshable).
    pub fn is_active(&self) -> bool {
        matches!(self, ImportStatus::Pending | ImportStatus::Importing)
    }

    pub fn can_transition_to(&self, next: ImportStatus) -> bool {
        use ImportStatus::*;
        match (self, next) {
            (Idle, Pending) => true,
            (Pending, Importing) => true,
            // Cancellation may strike before the task ever starts.
            (Pending, Error) => true,
            (Importing, Completed) | (Importing, Error) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Poll payloads
// ---------------------------------------------------------------------------

/// Live counts for a running (or finished) import.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportProgress {
    pub imported: u64,
    pub total: u64,
    /// Bounded sample of recent error messages (at most [`MAX_ERROR_SAMPLE`]).
    pub errors: Vec<String>,
    /// Human-readable label for what the task is currently doing.
    pub current_operation: Option<String>,
}

// Hand-written so every poll payload carries `percentage`; pollers
// should not have to re-derive it from the counts.
impl Serialize for ImportProgress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ImportProgress", 5)?;
        state.serialize_field("imported", &self.imported)?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("percentage", &self.percentage())?;
        state.serialize_field("errors", &self.errors)?;
        state.serialize_field("current_operation", &self.current_operation)?;
        state.end()
    }
}

impl ImportProgress {
    /// Integer completion percentage, clamped to 0..=100.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.imported as f64 / self.total as f64) * 100.0;
        pct.round().clamp(0.0, 100.0) as u8
    }

    /// Truncate the error sample to the bounded size.
    pub fn truncate_errors(&mut self) {
        self.errors.truncate(MAX_ERROR_SAMPLE);
    }
}

/// Everything a poller learns about one import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStatusData {
    pub status: ImportStatus,
    pub progress: Option<ImportProgress>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub last_checked: Timestamp,
}

impl ImportStatusData {
    /// Fresh record for a run that has not begun.
    pub fn idle(now: Timestamp) -> Self {
        Self {
            status: ImportStatus::Idle,
            progress: None,
            started_at: None,
            completed_at: None,
            error_message: None,
            last_checked: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Import ids
// ---------------------------------------------------------------------------

/// Mint an import id: `{platform}-{unix_millis}`.
pub fn mint_import_id(platform: Platform, now: Timestamp) -> String {
    format!("{}-{}", platform.as_str(), now.timestamp_millis())
}

/// Recover the platform from an import id.
///
/// The id is split at the **last** `-` so platform names containing the
/// separator stay intact, matching the OAuth state convention.
pub fn parse_import_id(id: &str) -> Option<(Platform, i64)> {
    let (head, tail) = id.rsplit_once('-')?;
    let millis: i64 = tail.parse().ok()?;
    let platform = Platform::parse(head).ok()?;
    Some((platform, millis))
}

// ---------------------------------------------------------------------------
// Log-based reconstruction
// ---------------------------------------------------------------------------

/// The slice of a `bulk_import` sync log row needed to rebuild status.
#[derive(Debug, Clone)]
pub struct BulkImportLogView {
    pub status: LogStatus,
    pub message: Option<String>,
    pub created_at: Timestamp,
    /// Counts parsed from the row's response snapshot, when present.
    pub imported: Option<u64>,
    pub total: Option<u64>,
}

/// Rebuild poll status from the most recent `bulk_import` log row.
///
/// `None` (no bulk import ever ran) yields `idle`. This is the fallback
/// path for unknown import ids and for polls after a process restart; it
/// must never panic.
pub fn reconstruct_from_log(latest: Option<&BulkImportLogView>, now: Timestamp) -> ImportStatusData {
    let Some(row) = latest else {
        return ImportStatusData::idle(now);
    };

    let (status, error_message) = match row.status {
        LogStatus::Success => (ImportStatus::Completed, None),
        LogStatus::Warning => (ImportStatus::Completed, row.message.clone()),
        LogStatus::Error => (ImportStatus::Error, row.message.clone()),
    };

    let progress = row.imported.map(|imported| ImportProgress {
        imported,
        total: row.total.unwrap_or(imported),
        errors: Vec::new(),
        current_operation: None,
    });

    ImportStatusData {
        status,
        progress,
        started_at: None,
        completed_at: Some(row.created_at),
        error_message,
        last_checked: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_terminal_and_active() {
        assert!(ImportStatus::Completed.is_terminal());
        assert!(ImportStatus::Error.is_terminal());
        assert!(!ImportStatus::Importing.is_terminal());
        assert!(ImportStatus::Pending.is_active());
        assert!(!ImportStatus::Completed.is_active());
    }

    #[test]
    fn test_transitions() {
        assert!(ImportStatus::Idle.can_transition_to(ImportStatus::Pending));
        assert!(ImportStatus::Pending.can_transition_to(ImportStatus::Importing));
        assert!(ImportStatus::Pending.can_transition_to(ImportStatus::Error));
        assert!(ImportStatus::Importing.can_transition_to(ImportStatus::Completed));
        assert!(!ImportStatus::Completed.can_transition_to(ImportStatus::Importing));
        assert!(!ImportStatus::Error.can_transition_to(ImportStatus::Completed));
    }

    #[test]
    fn test_percentage() {
        let p = ImportProgress {
            imported: 47,
            total: 50,
            ..Default::default()
        };
        assert_eq!(p.percentage(), 94);

        let empty = ImportProgress::default();
        assert_eq!(empty.percentage(), 0);
    }

    #[test]
    fn test_progress_serializes_percentage() {
        let p = ImportProgress {
            imported: 47,
            total: 50,
            ..Default::default()
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["percentage"], 94);
        assert_eq!(json["imported"], 47);
    }

    #[test]
    fn test_import_id_roundtrip() {
        let now = at(1_700_000_000);
        let id = mint_import_id(Platform::Shopify, now);
        assert_eq!(id, format!("shopify-{}", now.timestamp_millis()));

        let (platform, millis) = parse_import_id(&id).unwrap();
        assert_eq!(platform, Platform::Shopify);
        assert_eq!(millis, now.timestamp_millis());

        assert!(parse_import_id("garbage").is_none());
        assert!(parse_import_id("shopify-notanumber").is_none());
    }

    #[test]
    fn test_reconstruct_with_no_history_is_idle() {
        let data = reconstruct_from_log(None, at(10));
        assert_eq!(data.status, ImportStatus::Idle);
        assert!(data.progress.is_none());
    }

    #[test]
    fn test_reconstruct_completed_with_counts() {
        let row = BulkImportLogView {
            status: LogStatus::Success,
            message: Some("imported 120 products".into()),
            created_at: at(5),
            imported: Some(120),
            total: Some(120),
        };
        let data = reconstruct_from_log(Some(&row), at(10));
        assert_eq!(data.status, ImportStatus::Completed);
        let progress = data.progress.unwrap();
        assert_eq!(progress.imported, 120);
        assert_eq!(progress.percentage(), 100);
        assert_eq!(data.completed_at, Some(at(5)));
    }

    #[test]
    fn test_reconstruct_error_carries_message() {
        let row = BulkImportLogView {
            status: LogStatus::Error,
            message: Some("remote listing failed".into()),
            created_at: at(5),
            imported: None,
            total: None,
        };
        let data = reconstruct_from_log(Some(&row), at(10));
        assert_eq!(data.status, ImportStatus::Error);
        assert_eq!(data.error_message.as_deref(), Some("remote listing failed"));
        assert!(data.progress.is_none());
    }
}
