//! Client-wide configuration.
//!
//! `ClientConfig` is what a built `HttpClient` holds; it never changes after
//! construction. `ClientSettings` is the serializable subset that can come
//! from a JSON document or the environment.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ErrorFormatter};
use crate::http::Headers;
use crate::pipeline::RequestDescriptor;
use crate::plugin::PluginRegistry;
use crate::transport::Transport;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const ENV_BASE_URL: &str = "FETCHWISE_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "FETCHWISE_TIMEOUT_MS";

/// Computes the headers every relative request starts with.
pub type HeaderSupplier = Arc<dyn Fn(&RequestDescriptor) -> Headers + Send + Sync>;

pub struct ClientConfig {
    /// Stored without a trailing slash.
    pub base_url: String,
    pub default_headers: Option<HeaderSupplier>,
    pub timeout: Duration,
    pub error_formatter: ErrorFormatter,
    pub plugins: PluginRegistry,
    pub transport: Arc<dyn Transport>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers.is_some())
            .field("timeout", &self.timeout)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

/// Plain settings for building a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::InvalidSettings(e.to_string()))?;
        settings.validate()
    }

    /// Read `FETCHWISE_BASE_URL` (required) and `FETCHWISE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(ENV_BASE_URL)
            .ok_or_else(|| ConfigError::InvalidSettings(format!("{ENV_BASE_URL} is not set")))?;
        let timeout_ms = match lookup(ENV_TIMEOUT_MS) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidSettings(format!("{ENV_TIMEOUT_MS}={raw} is not a number")))?,
            None => DEFAULT_TIMEOUT_MS,
        };
        Self { base_url, timeout_ms }.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
