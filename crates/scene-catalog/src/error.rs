//! Error types for catalog search and band reads.

use std::time::Duration;

use risk_common::{BandId, RiskError, Retryable};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog request timed out: {0}")]
    Timeout(String),

    /// 5xx, 429 or a connection failure.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// Any other non-success response.
    #[error("Catalog rejected request: {0}")]
    Rejected(String),

    #[error("Failed to decode catalog response: {0}")]
    Decode(String),

    #[error("Scene {scene} has no {band} asset")]
    MissingAsset { scene: String, band: BandId },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No scene found: {0}")]
    NotFound(String),

    #[error("Empty region: {0}")]
    EmptyRegion(String),

    #[error("Band geometry mismatch: {0}")]
    GeometryMismatch(String),
}

impl Retryable for CatalogError {
    fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::Timeout(_) | CatalogError::Unavailable(_))
    }

    fn timed_out(operation: &str, after: Duration) -> Self {
        CatalogError::Timeout(format!("{} timed out after {:?}", operation, after))
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout(err.to_string())
        } else if err.is_decode() {
            CatalogError::Decode(err.to_string())
        } else {
            CatalogError::Unavailable(err.to_string())
        }
    }
}

impl From<RiskError> for CatalogError {
    fn from(err: RiskError) -> Self {
        match err {
            RiskError::GeometryMismatch(msg) => CatalogError::GeometryMismatch(msg),
            RiskError::EmptyRegion(msg) => CatalogError::EmptyRegion(msg),
            RiskError::InvalidRequest(msg) => CatalogError::InvalidRequest(msg),
            RiskError::NotFound(msg) => CatalogError::NotFound(msg),
            RiskError::UpstreamTimeout(msg) => CatalogError::Timeout(msg),
            RiskError::UpstreamUnavailable(msg) => CatalogError::Unavailable(msg),
            RiskError::CorruptData(msg) => CatalogError::Decode(msg),
            other => CatalogError::Decode(other.to_string()),
        }
    }
}

impl From<CatalogError> for RiskError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Timeout(msg) => RiskError::UpstreamTimeout(msg),
            CatalogError::Unavailable(msg) | CatalogError::Rejected(msg) => {
                RiskError::UpstreamUnavailable(msg)
            }
            CatalogError::Decode(msg) => {
                RiskError::CorruptData(format!("undecodable catalog data: {}", msg))
            }
            e @ CatalogError::MissingAsset { .. } => RiskError::NotFound(e.to_string()),
            CatalogError::InvalidRequest(msg) => RiskError::InvalidRequest(msg),
            CatalogError::NotFound(msg) => RiskError::NotFound(msg),
            CatalogError::EmptyRegion(msg) => RiskError::EmptyRegion(msg),
            CatalogError::GeometryMismatch(msg) => RiskError::GeometryMismatch(msg),
        }
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_upstream_failures_retry() {
        assert!(CatalogError::Timeout("t".into()).is_retryable());
        assert!(CatalogError::Unavailable("503".into()).is_retryable());
        assert!(!CatalogError::Decode("bad tiff".into()).is_retryable());
        assert!(!CatalogError::GeometryMismatch("x".into()).is_retryable());
        assert!(!CatalogError::Rejected("400".into()).is_retryable());
    }

    #[test]
    fn test_maps_into_risk_error() {
        let err: RiskError = CatalogError::Timeout("search".into()).into();
        assert!(matches!(err, RiskError::UpstreamTimeout(_)));

        let err: RiskError = CatalogError::MissingAsset {
            scene: "S2A_1".into(),
            band: BandId::Nir,
        }
        .into();
        assert!(matches!(err, RiskError::NotFound(_)));
    }

    #[test]
    fn test_decode_failure_is_fatal() {
        let err: RiskError = CatalogError::Decode("truncated TIFF".into()).into();
        assert!(matches!(err, RiskError::CorruptData(ref m) if m.contains("truncated TIFF")));
        assert!(!err.is_retryable());
    }
}
