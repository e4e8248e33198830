//! Image storage contract.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the image store.
#[derive(Debug, Error)]
pub enum ImageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upload was rejected.
    #[error("Upload failed: {status} - {message}")]
    Upload { status: u16, message: String },

    /// The file is not something we accept.
    #[error("Invalid image: {0}")]
    Invalid(String),
}

/// An image file received from the admin UI.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Accepts binary images and returns a retrievable URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `image`, returning its public delivery URL.
    async fn upload(&self, image: ImageUpload) -> Result<String, ImageError>;
}
