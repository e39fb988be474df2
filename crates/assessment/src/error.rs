//! Configuration errors.
//!
//! Pipeline failures are reported as [`risk_common::RiskError`].

use risk_common::RiskError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for RiskError {
    fn from(err: ConfigError) -> Self {
        RiskError::Internal(err.to_string())
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
