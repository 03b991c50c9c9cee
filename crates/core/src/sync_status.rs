//! Channel mapping status machine and sync log vocabulary.
//!
//! The mapping status is a closed enumeration with an explicit transition
//! table; repositories reject illegal transitions instead of trusting
//! callers with raw strings.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Mapping sync status
// ---------------------------------------------------------------------------

/// Lifecycle state of a channel mapping.
///
/// ```text
/// PENDING --(sync invoked)--> SYNCING --(remote ok)--> SUCCESS
///                                     --(remote err)-> ERROR
/// ```
///
/// `SYNCING` is written before the remote call starts, so a crash
/// mid-flight leaves an observable stuck-syncing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Syncing,
    Success,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(SyncStatus::Pending),
            "syncing" => Ok(SyncStatus::Syncing),
            "success" => Ok(SyncStatus::Success),
            "error" => Ok(SyncStatus::Error),
            other => Err(CoreError::Validation(format!(
                "Unknown sync status: '{other}'"
            ))),
        }
    }

    /// Transition table for the mapping state machine.
    ///
    /// Terminal states may re-enter `Syncing` (retry / re-sync); every
    /// state may be re-written with itself (idempotent upsert).
    pub fn can_transition_to(&self, next: SyncStatus) -> bool {
        use SyncStatus::*;
        match (self, next) {
            (a, b) if *a == b => true,
            (Pending, Syncing) => true,
            (Syncing, Success) | (Syncing, Error) => true,
            // Retry after a terminal outcome goes back through Syncing.
            (Success, Syncing) | (Error, Syncing) => true,
            _ => false,
        }
    }

    /// Validate a proposed transition, for use at the store boundary.
    pub fn validate_transition(&self, next: SyncStatus) -> Result<(), CoreError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Illegal sync status transition: {} -> {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Sync operations and log statuses
// ---------------------------------------------------------------------------

/// What a sync attempt was trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
    BulkImport,
}

impl SyncOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
            SyncOperation::Delete => "delete",
            SyncOperation::BulkImport => "bulk_import",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "create" => Ok(SyncOperation::Create),
            "update" => Ok(SyncOperation::Update),
            "delete" => Ok(SyncOperation::Delete),
            "bulk_import" => Ok(SyncOperation::BulkImport),
            other => Err(CoreError::Validation(format!(
                "Unknown sync operation: '{other}'"
            ))),
        }
    }
}

/// Outcome recorded by a sync log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Error,
    Warning,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Error => "error",
            LogStatus::Warning => "warning",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "success" => Ok(LogStatus::Success),
            "error" => Ok(LogStatus::Error),
            "warning" => Ok(LogStatus::Warning),
            other => Err(CoreError::Validation(format!(
                "Unknown log status: '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(SyncStatus::Pending.can_transition_to(SyncStatus::Syncing));
        assert!(SyncStatus::Syncing.can_transition_to(SyncStatus::Success));
        assert!(SyncStatus::Syncing.can_transition_to(SyncStatus::Error));
    }

    #[test]
    fn test_retry_reenters_syncing() {
        assert!(SyncStatus::Error.can_transition_to(SyncStatus::Syncing));
        assert!(SyncStatus::Success.can_transition_to(SyncStatus::Syncing));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        assert!(!SyncStatus::Pending.can_transition_to(SyncStatus::Success));
        assert!(!SyncStatus::Success.can_transition_to(SyncStatus::Pending));
        assert!(SyncStatus::Syncing
            .validate_transition(SyncStatus::Pending)
            .is_err());
    }

    #[test]
    fn test_self_transition_is_idempotent() {
        for s in [
            SyncStatus::Pending,
            SyncStatus::Syncing,
            SyncStatus::Success,
            SyncStatus::Error,
        ] {
            assert!(s.can_transition_to(s), "status: {}", s.as_str());
        }
    }

    #[test]
    fn test_string_roundtrip() {
        for s in ["pending", "syncing", "success", "error"] {
            assert_eq!(SyncStatus::parse(s).unwrap().as_str(), s);
        }
        for op in ["create", "update", "delete", "bulk_import"] {
            assert_eq!(SyncOperation::parse(op).unwrap().as_str(), op);
        }
        assert!(SyncStatus::parse("done").is_err());
        assert!(SyncOperation::parse("upsert").is_err());
    }
}
