//! Error taxonomy for the risk assessment pipeline.
//!
//! Every lower-level failure (catalog, band decode, weather, scoring) is
//! mapped into [`RiskError`] before it leaves the pipeline, so callers only
//! ever see one of the kinds below plus a human-readable message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bbox::BboxError;

/// Result type alias using RiskError.
pub type RiskResult<T> = Result<T, RiskError>;

/// Primary error type crossing the pipeline boundary.
#[derive(Debug, Error)]
pub enum RiskError {
    // === Request errors ===
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // === Data errors ===
    #[error("No scene found: {0}")]
    NotFound(String),

    #[error("Empty region: {0}")]
    EmptyRegion(String),

    #[error("Band geometry mismatch: {0}")]
    GeometryMismatch(String),

    #[error("Insufficient vegetation data: {0}")]
    InsufficientVegetationData(String),

    // === Upstream errors ===
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Source data that can never decode; fatal for the request.
    #[error("Corrupt source data: {0}")]
    CorruptData(String),

    // === Request lifecycle ===
    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RiskError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RiskError::UpstreamTimeout(_) | RiskError::UpstreamUnavailable(_)
        )
    }

    /// The wire status reported for this error.
    pub fn status(&self) -> RiskStatus {
        match self {
            RiskError::InvalidRequest(_) => RiskStatus::InvalidRequest,
            RiskError::NotFound(_) => RiskStatus::NotFound,
            RiskError::EmptyRegion(_) => RiskStatus::EmptyRegion,
            RiskError::GeometryMismatch(_) => RiskStatus::GeometryMismatch,
            RiskError::InsufficientVegetationData(_) => RiskStatus::InsufficientVegetationData,
            RiskError::UpstreamTimeout(_) => RiskStatus::UpstreamTimeout,
            RiskError::UpstreamUnavailable(_) => RiskStatus::UpstreamUnavailable,
            RiskError::CorruptData(_) => RiskStatus::CorruptData,
            RiskError::Cancelled => RiskStatus::Cancelled,
            RiskError::Internal(_) => RiskStatus::Internal,
        }
    }

    /// Get the HTTP status code a web layer should use for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            RiskError::InvalidRequest(_) => 400,

            RiskError::NotFound(_) => 404,

            RiskError::EmptyRegion(_)
            | RiskError::GeometryMismatch(_)
            | RiskError::InsufficientVegetationData(_) => 422,

            RiskError::UpstreamUnavailable(_) | RiskError::CorruptData(_) => 502,
            RiskError::UpstreamTimeout(_) => 504,

            // Client closed request
            RiskError::Cancelled => 499,

            RiskError::Internal(_) => 500,
        }
    }
}

impl From<BboxError> for RiskError {
    fn from(err: BboxError) -> Self {
        RiskError::InvalidRequest(err.to_string())
    }
}

impl From<serde_json::Error> for RiskError {
    fn from(err: serde_json::Error) -> Self {
        RiskError::Internal(format!("JSON error: {}", err))
    }
}

/// Outcome reported in the `status` field of every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    Success,
    /// Scored, but the vegetation signal could not be computed.
    Inconclusive,
    InvalidRequest,
    NotFound,
    EmptyRegion,
    GeometryMismatch,
    InsufficientVegetationData,
    UpstreamTimeout,
    UpstreamUnavailable,
    CorruptData,
    Cancelled,
    Internal,
}

impl RiskStatus {
    /// Whether the response carries an assessment.
    pub fn has_assessment(&self) -> bool {
        matches!(self, RiskStatus::Success | RiskStatus::Inconclusive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Success => "success",
            RiskStatus::Inconclusive => "inconclusive",
            RiskStatus::InvalidRequest => "invalid_request",
            RiskStatus::NotFound => "not_found",
            RiskStatus::EmptyRegion => "empty_region",
            RiskStatus::GeometryMismatch => "geometry_mismatch",
            RiskStatus::InsufficientVegetationData => "insufficient_vegetation_data",
            RiskStatus::UpstreamTimeout => "upstream_timeout",
            RiskStatus::UpstreamUnavailable => "upstream_unavailable",
            RiskStatus::CorruptData => "corrupt_data",
            RiskStatus::Cancelled => "cancelled",
            RiskStatus::Internal => "internal",
        }
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
