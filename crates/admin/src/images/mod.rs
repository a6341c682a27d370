//! Product image hosting.
//!
//! Product photos are uploaded to a third-party host (imgbb-compatible API):
//!
//! ```text
//! POST <upload_url>  multipart {key, image}
//!   -> {"success": true,  "data": {"url": "..."}}
//!   -> {"success": false, "error": {"message": "..."}}
//! ```
//!
//! The API key is entered on the settings tab, so it is passed per call
//! rather than baked into the client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::ImageHostConfig;

/// Largest image accepted for upload (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Errors that can occur when uploading an image.
#[derive(Debug, Error)]
pub enum ImageStoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The host reported a failure.
    #[error("{0}")]
    Rejected(String),

    /// Response body could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// An image file submitted with the product form.
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Size of the file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the file exceeds [`MAX_IMAGE_BYTES`].
    #[must_use]
    pub fn is_oversized(&self) -> bool {
        self.len() > MAX_IMAGE_BYTES
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Image hosting service.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload an image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `ImageStoreError` on transport failure or when the host
    /// reports `success: false`.
    async fn upload(&self, api_key: &SecretString, image: &ImageUpload)
    -> Result<String, ImageStoreError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: Option<String>,
}

/// Client for an imgbb-compatible upload endpoint.
#[derive(Clone)]
pub struct ImgbbClient {
    inner: Arc<ImgbbClientInner>,
}

struct ImgbbClientInner {
    client: reqwest::Client,
    upload_url: Url,
}

impl ImgbbClient {
    /// Create a new upload client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ImageHostConfig, timeout: Duration) -> Result<Self, ImageStoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(ImgbbClientInner {
                client,
                upload_url: config.upload_url.clone(),
            }),
        })
    }
}

#[async_trait]
impl ImageStore for ImgbbClient {
    #[instrument(skip(self, api_key), fields(file = %image.file_name, bytes = image.len()))]
    async fn upload(
        &self,
        api_key: &SecretString,
        image: &ImageUpload,
    ) -> Result<String, ImageStoreError> {
        let mut part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        if let Some(content_type) = &image.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new()
            .text("key", api_key.expose_secret().to_owned())
            .part("image", part);

        let response = self
            .inner
            .client
            .post(self.inner.upload_url.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let url = interpret_upload(status, &body)?;
        tracing::info!(%url, "image uploaded");
        Ok(url)
    }
}

/// Turn an upload response into a URL or an error.
pub(crate) fn interpret_upload(status: u16, body: &str) -> Result<String, ImageStoreError> {
    let parsed: UploadResponse = serde_json::from_str(body).map_err(|e| {
        ImageStoreError::Parse(format!("status {status}: {e}"))
    })?;

    if parsed.success
        && let Some(data) = parsed.data
        && !data.url.is_empty()
    {
        return Ok(data.url);
    }

    let message = parsed
        .error
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("Image upload failed (status {status})"));
    Err(ImageStoreError::Rejected(message))
}
