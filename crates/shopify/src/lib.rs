//! HTTP client for the Shopify Admin API.
//!
//! Three surfaces:
//! - [`oauth`]: authorize-URL construction, the authorization-code
//!   exchange, and the post-exchange connectivity probe.
//! - [`client`] / [`graphql`]: authenticated GraphQL calls with
//!   `userErrors` checking.
//! - [`media`]: the two-phase staged upload protocol for product images.

pub mod client;
pub mod config;
pub mod graphql;
pub mod media;
pub mod oauth;

pub use client::{ShopifyApiError, ShopifyClient};
pub use config::ShopifyConfig;
