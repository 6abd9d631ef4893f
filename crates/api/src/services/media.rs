//! Card image uploads to Cloudinary.
//!
//! Images are forwarded as-is with a signed upload; no resizing happens here.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::CloudinaryConfig;
use crate::models::ValidationErrors;

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Accepted file extensions (lowercase).
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "gif", "png", "webp"];

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the media service.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The file is not an acceptable image.
    #[error("{0}")]
    Invalid(ValidationErrors),

    /// No media store credentials are configured.
    #[error("image uploads are not configured")]
    NotConfigured,

    /// The media store rejected the upload or could not be reached.
    #[error("{0}")]
    Upstream(String),
}

/// An uploaded file as received from the client.
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A hosted image.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    pub secure_url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorDetail,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

impl ImageUpload {
    /// Check type, extension, and size.
    ///
    /// # Errors
    ///
    /// Returns every failed rule as a full message.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
        {
            errors.add("image", "must be an image file");
        }

        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if !extension.is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e.as_str())) {
            errors.add("image", "must be a JPG, JPEG, GIF, PNG, or WEBP file");
        }

        if self.bytes.len() > MAX_IMAGE_BYTES {
            errors.add("image", "is too large (maximum is 10 MB)");
        }

        errors.into_result(())
    }
}

/// Signature for a Cloudinary signed upload: SHA-1 hex of the sorted
/// `key=value` parameters joined by `&`, followed by the API secret.
fn upload_signature(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_unstable_by_key(|(k, _)| *k);
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Uploads card images.
#[derive(Debug, Clone)]
pub struct MediaService {
    client: Client,
    config: Option<CloudinaryConfig>,
}

impl MediaService {
    /// Create a media service. Uploads fail with `NotConfigured` when
    /// `config` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Upstream` if the HTTP client cannot be built.
    pub fn new(config: Option<CloudinaryConfig>) -> Result<Self, MediaError> {
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| MediaError::Upstream(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Validate and upload an image.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Invalid` for unacceptable files and
    /// `MediaError::Upstream` when the media store fails.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload(&self, upload: ImageUpload) -> Result<UploadedImage, MediaError> {
        upload.validate().map_err(MediaError::Invalid)?;
        let config = self.config.as_ref().ok_or(MediaError::NotConfigured)?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = upload_signature(
            &[("folder", &config.folder), ("timestamp", &timestamp)],
            config.api_secret.expose_secret(),
        );

        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(content_type) = &upload.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| MediaError::Upstream(e.to_string()))?;
        }

        let form = Form::new()
            .text("api_key", config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", config.folder.clone())
            .text("signature", signature)
            .part("file", part);

        let response = self
            .client
            .post(format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                config.cloud_name
            ))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Upstream(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MediaError::Upstream(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<CloudinaryErrorBody>(&body)
                .map_or_else(|_| format!("upload failed with status {status}"), |b| b.error.message);
            warn!(status = %status, message = %message, "Cloudinary upload failed");
            return Err(MediaError::Upstream(message));
        }

        let image: UploadedImage =
            serde_json::from_str(&body).map_err(|e| MediaError::Upstream(e.to_string()))?;
        info!(public_id = %image.public_id, "Image uploaded");
        Ok(image)
    }
}
