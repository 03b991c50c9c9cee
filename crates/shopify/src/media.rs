//! Two-phase staged media uploads.
//!
//! Stage: one `stagedUploadsCreate` call covering every image. Upload:
//! per image, fetch the source bytes and POST a multipart body whose
//! fields follow the staged target's signed parameter order with the
//! file part last. Staging failures abort the whole batch; per-image
//! download/upload failures drop that image with a warning.

use async_trait::async_trait;
use catsync_core::media::{
    filename_from_url, mime_for_filename, plan_upload_form, FormField, StagedParameter,
    StagedUploadTarget,
};

use crate::client::{ShopifyApiError, ShopifyClient};
use crate::graphql::{StagedUploadInput, StagedUploadsCreateData, STAGED_UPLOADS_CREATE};

/// Errors from the staged upload protocol.
///
/// Only systemic failures surface here; individual image failures are
/// reported as warnings in [`MediaUploadOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The staging call reported item-level errors or came back
    /// malformed. The whole batch is aborted; nothing was uploaded.
    #[error("Staging failed: {0}")]
    StagingFailed(String),

    #[error(transparent)]
    Api(#[from] ShopifyApiError),
}

/// What survived the upload phase.
#[derive(Debug, Default)]
pub struct MediaUploadOutcome {
    /// Durable resource URLs, one per successfully uploaded image, in
    /// input order.
    pub resource_urls: Vec<String>,
    /// One message per dropped image.
    pub warnings: Vec<String>,
}

/// One source image paired with its staged target.
#[derive(Debug, Clone)]
pub struct StagedImage {
    pub source_url: String,
    pub filename: String,
    pub target: StagedUploadTarget,
}

/// Per-image transfer operations, split from the batch loop so the
/// drop-with-warning behavior can be exercised without a network.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Fetch the source image bytes.
    async fn download(&self, source_url: &str) -> Result<Vec<u8>, String>;

    /// POST the bytes to the staged target as a multipart form.
    async fn upload(
        &self,
        target: &StagedUploadTarget,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), String>;
}

/// Upload every staged image through `transport`.
///
/// Each image degrades independently: a failed download or upload drops
/// that image and records one warning, and the rest still go through.
pub async fn run_uploads<T: MediaTransport + ?Sized>(
    transport: &T,
    staged: &[StagedImage],
) -> MediaUploadOutcome {
    let mut outcome = MediaUploadOutcome::default();
    for image in staged {
        let result = match transport.download(&image.source_url).await {
            Ok(bytes) => transport.upload(&image.target, &image.filename, bytes).await,
            Err(warning) => Err(warning),
        };
        match result {
            Ok(()) => outcome.resource_urls.push(image.target.resource_url.clone()),
            Err(warning) => {
                tracing::warn!(
                    source_url = %image.source_url,
                    warning = %warning,
                    "Dropping image from staged upload"
                );
                outcome.warnings.push(warning);
            }
        }
    }
    outcome
}

/// Production transport over plain HTTP.
pub struct HttpMediaTransport {
    http: reqwest::Client,
}

impl HttpMediaTransport {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpMediaTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaTransport for HttpMediaTransport {
    async fn download(&self, source_url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| format!("download failed for {source_url}: {e}"))?;
        if !response.status().is_success() {
            return Err(format!(
                "download failed for {source_url}: status {}",
                response.status()
            ));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("download failed for {source_url}: {e}"))?;
        Ok(bytes.to_vec())
    }

    async fn upload(
        &self,
        target: &StagedUploadTarget,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), String> {
        let mut form = reqwest::multipart::Form::new();
        for field in plan_upload_form(target, filename) {
            form = match field {
                FormField::Text { name, value } => form.text(name, value),
                FormField::File { name, filename } => {
                    let part = reqwest::multipart::Part::bytes(bytes.clone())
                        .file_name(filename.clone())
                        .mime_str(mime_for_filename(&filename))
                        .map_err(|e| format!("invalid mime for {filename}: {e}"))?;
                    form.part(name, part)
                }
            };
        }

        let upload = self
            .http
            .post(&target.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("upload failed: {e}"))?;
        if !upload.status().is_success() {
            return Err(format!("upload failed: status {}", upload.status()));
        }
        Ok(())
    }
}

/// Runs the two-phase protocol for one shop.
pub struct StagedMediaUploader<'a> {
    shopify: &'a ShopifyClient,
    transport: HttpMediaTransport,
}

impl<'a> StagedMediaUploader<'a> {
    pub fn new(shopify: &'a ShopifyClient) -> Self {
        Self {
            shopify,
            transport: HttpMediaTransport::new(),
        }
    }

    /// Stage and upload every image, returning the surviving references.
    ///
    /// Returns `Err(MediaError::StagingFailed)` only when the staging
    /// call itself fails; from then on each image degrades
    /// independently.
    pub async fn upload_all(&self, image_urls: &[String]) -> Result<MediaUploadOutcome, MediaError> {
        if image_urls.is_empty() {
            return Ok(MediaUploadOutcome::default());
        }

        let staged = self.stage(image_urls).await?;
        Ok(run_uploads(&self.transport, &staged).await)
    }

    /// Phase one: request one upload target per image.
    ///
    /// Targets come back in submission order; the result pairs each
    /// source URL with its derived filename and target.
    async fn stage(&self, image_urls: &[String]) -> Result<Vec<StagedImage>, MediaError> {
        let filenames: Vec<String> = image_urls.iter().map(|u| filename_from_url(u)).collect();
        let inputs: Vec<StagedUploadInput> = filenames
            .iter()
            .map(|filename| StagedUploadInput {
                resource: "IMAGE".to_string(),
                filename: filename.clone(),
                mime_type: mime_for_filename(filename).to_string(),
                http_method: "POST".to_string(),
            })
            .collect();

        let data: StagedUploadsCreateData = self
            .shopify
            .graphql(
                STAGED_UPLOADS_CREATE,
                serde_json::json!({ "input": inputs }),
            )
            .await?;

        let payload = data.staged_uploads_create;
        if !payload.user_errors.is_empty() {
            let joined = payload
                .user_errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(MediaError::StagingFailed(joined));
        }
        if payload.staged_targets.len() != image_urls.len() {
            return Err(MediaError::StagingFailed(format!(
                "expected {} staged targets, got {}",
                image_urls.len(),
                payload.staged_targets.len()
            )));
        }

        Ok(image_urls
            .iter()
            .zip(filenames)
            .zip(payload.staged_targets)
            .map(|((source_url, filename), target)| StagedImage {
                source_url: source_url.clone(),
                filename,
                target: StagedUploadTarget {
                    url: target.url,
                    resource_url: target.resource_url,
                    parameters: target
                        .parameters
                        .into_iter()
                        .map(|p| StagedParameter {
                            name: p.name,
                            value: p.value,
                        })
                        .collect(),
                },
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubTransport {
        fail_download_on: Option<&'static str>,
        fail_upload_on: Option<&'static str>,
    }

    #[async_trait]
    impl MediaTransport for StubTransport {
        async fn download(&self, source_url: &str) -> Result<Vec<u8>, String> {
            match self.fail_download_on {
                Some(marker) if source_url.contains(marker) => {
                    Err(format!("download failed for {source_url}: status 404"))
                }
                _ => Ok(b"bytes".to_vec()),
            }
        }

        async fn upload(
            &self,
            target: &StagedUploadTarget,
            _filename: &str,
            _bytes: Vec<u8>,
        ) -> Result<(), String> {
            match self.fail_upload_on {
                Some(marker) if target.url.contains(marker) => {
                    Err("upload failed: status 500".to_string())
                }
                _ => Ok(()),
            }
        }
    }

    fn staged(names: &[&str]) -> Vec<StagedImage> {
        names
            .iter()
            .map(|name| StagedImage {
                source_url: format!("https://source/{name}.png"),
                filename: format!("{name}.png"),
                target: StagedUploadTarget {
                    url: format!("https://upload/{name}"),
                    resource_url: format!("https://cdn/{name}"),
                    parameters: Vec::new(),
                },
            })
            .collect()
    }

    #[tokio::test]
    async fn test_failed_download_drops_only_that_image() {
        let transport = StubTransport {
            fail_download_on: Some("two"),
            fail_upload_on: None,
        };
        let outcome = run_uploads(&transport, &staged(&["one", "two", "three"])).await;

        assert_eq!(
            outcome.resource_urls,
            vec!["https://cdn/one", "https://cdn/three"]
        );
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("two"));
    }

    #[tokio::test]
    async fn test_failed_upload_drops_only_that_image() {
        let transport = StubTransport {
            fail_download_on: None,
            fail_upload_on: Some("three"),
        };
        let outcome = run_uploads(&transport, &staged(&["one", "two", "three"])).await;

        assert_eq!(
            outcome.resource_urls,
            vec!["https://cdn/one", "https://cdn/two"]
        );
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_all_images_survive() {
        let transport = StubTransport {
            fail_download_on: None,
            fail_upload_on: None,
        };
        let outcome = run_uploads(&transport, &staged(&["one", "two"])).await;

        assert_eq!(outcome.resource_urls.len(), 2);
        assert!(outcome.warnings.is_empty());
    }
}
