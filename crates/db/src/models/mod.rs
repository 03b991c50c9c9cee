//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - An update DTO (all `Option` fields) where patches apply

pub mod channel_mapping;
pub mod connection;
pub mod product;
pub mod sync_log;
