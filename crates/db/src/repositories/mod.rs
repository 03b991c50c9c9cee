//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod channel_mapping_repo;
pub mod connection_repo;
pub mod product_repo;
pub mod sync_log_repo;

pub use channel_mapping_repo::{ChannelMappingRepo, MappingStoreError};
pub use connection_repo::ConnectionRepo;
pub use product_repo::ProductRepo;
pub use sync_log_repo::SyncLogRepo;
