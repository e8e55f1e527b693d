//! Error types for page rendering

use thiserror::Error;

/// Errors that can occur while rendering a page
#[derive(Debug, Error)]
pub enum RenderError {
    /// QR code encoding failed
    #[error("QR code for element '{element_id}' could not be generated: {message}")]
    QrCode { element_id: String, message: String },

    /// Image could not be decoded or resized
    #[error("Image processing failed: {0}")]
    Image(String),

    /// Data URI is not valid base64 image data
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// JSON encoding of page content failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
