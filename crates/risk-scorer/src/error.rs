//! Error types for risk scoring.

use risk_common::RiskError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    /// No valid vegetation pixels and the policy forbids weather-only scores.
    #[error("insufficient vegetation data: {0}")]
    InsufficientVegetationData(String),

    #[error("invalid scoring input: {0}")]
    InvalidInput(String),
}

impl From<ScoringError> for RiskError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::InsufficientVegetationData(msg) => {
                RiskError::InsufficientVegetationData(msg)
            }
            ScoringError::InvalidInput(msg) => RiskError::Internal(msg),
        }
    }
}

/// Result type for scoring operations.
pub type Result<T> = std::result::Result<T, ScoringError>;
