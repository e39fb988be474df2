//! Error types for weather lookups.

use std::time::Duration;

use risk_common::{RiskError, Retryable};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Weather request timed out: {0}")]
    Timeout(String),

    /// 5xx, 429 or a connection failure.
    #[error("Weather service unavailable: {0}")]
    Unavailable(String),

    /// Any other non-success response.
    #[error("Weather service rejected request: {0}")]
    Rejected(String),

    #[error("Failed to decode weather response: {0}")]
    Decode(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

impl Retryable for WeatherError {
    fn is_retryable(&self) -> bool {
        matches!(self, WeatherError::Timeout(_) | WeatherError::Unavailable(_))
    }

    fn timed_out(operation: &str, after: Duration) -> Self {
        WeatherError::Timeout(format!("{} timed out after {:?}", operation, after))
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Timeout(err.to_string())
        } else if err.is_decode() {
            WeatherError::Decode(err.to_string())
        } else {
            WeatherError::Unavailable(err.to_string())
        }
    }
}

impl From<WeatherError> for RiskError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::Timeout(msg) => RiskError::UpstreamTimeout(msg),
            WeatherError::Unavailable(msg) | WeatherError::Rejected(msg) => {
                RiskError::UpstreamUnavailable(msg)
            }
            WeatherError::Decode(msg) => {
                RiskError::CorruptData(format!("undecodable weather data: {}", msg))
            }
            WeatherError::InvalidCoordinates(msg) => RiskError::InvalidRequest(msg),
        }
    }
}

/// Result type for weather operations.
pub type Result<T> = std::result::Result<T, WeatherError>;
