//! Error taxonomy for sync operations.

use catsync_core::error::CoreError;
use catsync_core::platform::Platform;
use catsync_shopify::client::ShopifyApiError;
use catsync_shopify::media::MediaError;

/// Everything that can go wrong pushing or pulling a product.
///
/// Per-image upload failures are deliberately absent: they degrade into
/// warnings inside the media uploader and never propagate. A duplicate
/// connection insert is likewise downgraded to a warning at the call
/// site, not represented here.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No active connection exists for the platform. Terminal; retrying
    /// without reconnecting cannot succeed.
    #[error("No active {0} connection")]
    NoActiveConnection(Platform),

    /// The staging call failed wholesale; the product operation aborts
    /// rather than silently creating an image-less product.
    #[error("Staging failed: {0}")]
    StagingFailed(String),

    /// The platform rejected the payload at the item level.
    #[error("Remote validation error: {0}")]
    RemoteValidation(String),

    /// Generic remote or network failure.
    #[error("Sync failed: {0}")]
    SyncFailed(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ShopifyApiError> for SyncError {
    fn from(err: ShopifyApiError) -> Self {
        match err {
            ShopifyApiError::UserErrors(msg) => SyncError::RemoteValidation(msg),
            other => SyncError::SyncFailed(other.to_string()),
        }
    }
}

impl From<MediaError> for SyncError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::StagingFailed(msg) => SyncError::StagingFailed(msg),
            MediaError::Api(api) => api.into(),
        }
    }
}
