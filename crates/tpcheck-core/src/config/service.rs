//! Service endpoint configuration
//!
//! Builder-style configuration for the transport client: endpoint override,
//! custom headers, timeouts, and the opt-in retry budget.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Default remote endpoint for the hosted analysis service.
pub const DEFAULT_BASE_URL: &str = "https://api.tpcheck.dev";

/// Configuration rejected at client construction time.
#[derive(Error, Debug)]
#[error("invalid service configuration: {0}")]
pub struct ConfigError(pub(crate) String);

/// Timeout configuration for connection and request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Maximum time allowed to establish a connection to the service.
    #[serde(default = "TimeoutConfig::default_connection_timeout")]
    pub connection_timeout_ms: u64,

    /// Maximum time allowed for the complete request/response cycle. This is
    /// the deadline the client's internal abort signal fires on.
    #[serde(default = "TimeoutConfig::default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl TimeoutConfig {
    const fn default_connection_timeout() -> u64 {
        10_000
    }

    const fn default_request_timeout() -> u64 {
        30_000
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Tight timeouts for interactive use against a nearby deployment.
    pub fn quick() -> Self {
        Self {
            connection_timeout_ms: 2_000,
            request_timeout_ms: 5_000,
        }
    }

    pub fn with_connection_timeout_ms(mut self, ms: u64) -> Self {
        self.connection_timeout_ms = ms;
        self
    }

    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connection_timeout_ms: Self::default_connection_timeout(),
            request_timeout_ms: Self::default_request_timeout(),
        }
    }
}

/// Configuration for the service client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Endpoint base URL (overrides the hosted default)
    pub base_url: Option<String>,

    /// Custom HTTP headers to include in every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Timeout configuration
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Retry budget for retriable failures. Zero disables retries; debounced
    /// editor traffic should not be amplified silently.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            headers: HashMap::new(),
            timeouts: TimeoutConfig::default(),
            max_retries: 0,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Effective base URL with any trailing slash trimmed.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Validate the configuration before a client is built from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_url) = &self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError(format!(
                    "base URL must be http(s), got `{base_url}`"
                )));
            }
        }
        if self.timeouts.request_timeout_ms == 0 {
            return Err(ConfigError("request timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}
