//! Intake checks for uploaded images

use bytes::Bytes;
use image::{DynamicImage, ImageReader};
use sha2::{Digest, Sha256};
use std::io::Cursor;

use super::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only image files are allowed")]
    NotAnImage,

    #[error("File too large ({size} bytes). Maximum size is {max_mb}MB")]
    TooLarge { size: usize, max_mb: u64 },

    #[error("Invalid image file: empty upload")]
    Empty,

    #[error("Invalid image file: {0}")]
    Decode(String),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::TooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

/// One file taken from the multipart body
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Upload {
    /// Check declared type and size before any decoding work
    pub fn validate(&self, max_size_mb: u64) -> Result<(), UploadError> {
        let is_image = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(UploadError::NotAnImage);
        }

        let max_bytes = max_size_mb.saturating_mul(1024 * 1024);
        if (self.data.len() as u64) > max_bytes {
            return Err(UploadError::TooLarge {
                size: self.data.len(),
                max_mb: max_size_mb,
            });
        }
        if self.data.is_empty() {
            return Err(UploadError::Empty);
        }
        Ok(())
    }

    /// Lowercase hex SHA-256 of the raw bytes
    pub fn content_hash(&self) -> String {
        content_hash(&self.data)
    }
}

pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Decode from the content itself, ignoring the declared type
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, UploadError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| UploadError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| UploadError::Decode(e.to_string()))
}
