//! Product synchronization engine layer.
//!
//! Three services sit here, all reading connections and writing mappings
//! and log rows through `catsync-db`:
//! - [`engine::ProductSyncEngine`] pushes one product to the platform.
//! - [`batch::BatchSyncCoordinator`] fans many products into bounded
//!   concurrent chunks.
//! - [`import::ImportOrchestrator`] runs a full catalog pull as a
//!   detached, pollable background task.

pub mod batch;
pub mod engine;
pub mod error;
pub mod import;
pub mod transform;

pub use batch::BatchSyncCoordinator;
pub use engine::{ProductSync, ProductSyncEngine, SyncOutcome};
pub use error::SyncError;
pub use import::ImportOrchestrator;
