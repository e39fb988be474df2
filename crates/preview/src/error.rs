//! Error types for preview rendering.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("Invalid image dimensions {width}x{height} for {len} bytes")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("Preview bands are not aligned: {0}")]
    GeometryMismatch(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

impl From<std::io::Error> for PreviewError {
    fn from(err: std::io::Error) -> Self {
        PreviewError::Encode(err.to_string())
    }
}

/// Result type for preview operations.
pub type Result<T> = std::result::Result<T, PreviewError>;
