//! Cloudinary image uploads.
//!
//! Uses unsigned uploads against an upload preset, so no API secret is held
//! by the storefront. Each asset gets a timestamped public id derived from
//! the file name.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use shesha_core::timestamped_slug;
use tracing::instrument;

use crate::config::CloudinaryConfig;
use crate::services::{ImageError, ImageStore, ImageUpload};

const UPLOAD_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary upload client.
#[derive(Clone)]
pub struct CloudinaryStore {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryStore {
    #[must_use]
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: format!("{UPLOAD_BASE_URL}/{}/image/upload", config.cloud_name),
            upload_preset: config.upload_preset.clone(),
        }
    }
}

/// Public id for an uploaded file: its stem, slugged and timestamped.
fn public_id_for(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    timestamped_slug(stem, Utc::now())
}

fn validate(image: &ImageUpload) -> Result<(), ImageError> {
    if image.bytes.is_empty() {
        return Err(ImageError::Invalid("empty file".to_string()));
    }
    if let Some(content_type) = &image.content_type
        && !content_type.starts_with("image/")
    {
        return Err(ImageError::Invalid(format!(
            "unsupported content type: {content_type}"
        )));
    }
    Ok(())
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    #[instrument(skip(self, image), fields(file_name = %image.file_name, size = image.bytes.len()))]
    async fn upload(&self, image: ImageUpload) -> Result<String, ImageError> {
        validate(&image)?;

        let public_id = public_id_for(&image.file_name);
        let mut part = Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(content_type) = &image.content_type {
            part = part.mime_str(content_type)?;
        }

        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("public_id", public_id);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, message = %message, "Cloudinary upload failed");
            return Err(ImageError::Upload {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::info!(url = %uploaded.secure_url, "Uploaded image");
        Ok(uploaded.secure_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: Option<&str>, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: "Blue Vase.JPG".to_string(),
            content_type: content_type.map(str::to_string),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_public_id_uses_slugged_stem() {
        let id = public_id_for("Blue Vase.JPG");
        assert!(id.starts_with("blue-vase-"), "{id}");
    }

    #[test]
    fn test_validate() {
        assert!(validate(&upload(Some("image/png"), b"png")).is_ok());
        assert!(validate(&upload(None, b"png")).is_ok());
        assert!(matches!(
            validate(&upload(Some("text/plain"), b"hi")),
            Err(ImageError::Invalid(_))
        ));
        assert!(matches!(
            validate(&upload(Some("image/png"), b"")),
            Err(ImageError::Invalid(_))
        ));
    }
}
