use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_STREAM_ENDPOINT: &str = "http://127.0.0.1:8000/stream?stream=aircraft";
pub const DEFAULT_POLL_ENDPOINT: &str = "http://127.0.0.1:8000/aircraft";
pub const DEFAULT_HEARTBEAT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 10_000;

/// Settings for the push stream and its polling fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub endpoint: String,
    pub poll_endpoint: String,
    /// Silence longer than this on an open connection is a connection error.
    pub heartbeat_timeout_ms: u64,
    /// The initial connect must complete within this window.
    pub connection_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_STREAM_ENDPOINT.to_string(),
            poll_endpoint: DEFAULT_POLL_ENDPOINT.to_string(),
            heartbeat_timeout_ms: DEFAULT_HEARTBEAT_TIMEOUT_MS,
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
        }
    }
}

impl StreamConfig {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

/// Exponential backoff for the opt-in reconnect wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 1_000,
            max_ms: 300_000,
        }
    }
}

impl BackoffConfig {
    /// Delay before reconnect attempt `attempt` (1-based): `initial * 2^(attempt-1)`, capped at `max`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let millis = self
            .initial_ms
            .saturating_mul(2u64.saturating_pow(exponent))
            .min(self.max_ms);
        Duration::from_millis(millis)
    }
}
