//! Pure domain logic for the catalog synchronization service.
//!
//! No I/O lives here: status machines, batch arithmetic, OAuth state
//! handling, media filename derivation, and webhook signature
//! verification are all plain functions and types that the `db`,
//! `shopify`, `sync`, and `api` crates build on.

pub mod batch;
pub mod error;
pub mod import_status;
pub mod media;
pub mod oauth_state;
pub mod platform;
pub mod sync_status;
pub mod types;
pub mod webhook;
