//! Error types for index computation.

use risk_common::RiskError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VegetationError {
    /// Input bands do not share shape and geotransform.
    #[error("band geometry mismatch: {0}")]
    GeometryMismatch(String),

    /// Input bands hold no pixels.
    #[error("input bands contain no pixels")]
    EmptyRegion,

    /// Computation was aborted before it finished.
    #[error("index computation cancelled")]
    Cancelled,
}

impl From<VegetationError> for RiskError {
    fn from(err: VegetationError) -> Self {
        match err {
            VegetationError::GeometryMismatch(msg) => RiskError::GeometryMismatch(msg),
            VegetationError::EmptyRegion => {
                RiskError::EmptyRegion("input bands contain no pixels".to_string())
            }
            VegetationError::Cancelled => RiskError::Cancelled,
        }
    }
}

/// Result type for vegetation index operations.
pub type Result<T> = std::result::Result<T, VegetationError>;
