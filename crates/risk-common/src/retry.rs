//! Timeout and exponential-backoff retry for upstream calls.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RiskError;

/// Errors the retry loop knows how to classify.
pub trait Retryable: std::fmt::Display {
    /// Whether another attempt may succeed.
    fn is_retryable(&self) -> bool;

    /// The error reported when a single attempt exceeds the request timeout.
    fn timed_out(operation: &str, after: Duration) -> Self;
}

impl Retryable for RiskError {
    fn is_retryable(&self) -> bool {
        RiskError::is_retryable(self)
    }

    fn timed_out(operation: &str, after: Duration) -> Self {
        RiskError::UpstreamTimeout(format!("{} timed out after {:?}", operation, after))
    }
}

/// Retry policy for catalog and weather fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first try
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles each retry)
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Per-attempt timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_ms == 0 {
            return Err("retry.request_timeout_ms must be > 0".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(format!(
                "retry.initial_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            ));
        }
        Ok(())
    }

    /// Run `attempt` under the per-attempt timeout, retrying retryable
    /// failures with exponential backoff.
    ///
    /// Non-retryable errors are returned immediately. After `max_retries`
    /// retries the last error is returned.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable,
    {
        let timeout = self.request_timeout();
        let mut retry_count = 0;
        let mut delay = self.initial_delay();

        loop {
            let result = match tokio::time::timeout(timeout, attempt()).await {
                Ok(result) => result,
                Err(_) => Err(E::timed_out(operation, timeout)),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    retry_count += 1;
                    if retry_count > self.max_retries {
                        return Err(e);
                    }

                    warn!(
                        operation = operation,
                        error = %e,
                        retry = retry_count,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Upstream call failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    delay = self.next_delay(delay);
                }
            }
        }
    }

    /// Exponential backoff step, capped at `max_delay`.
    fn next_delay(&self, delay: Duration) -> Duration {
        std::cmp::min(delay.saturating_mul(2), self.max_delay())
    }
}
