//! Adapter configuration
//!
//! Connection settings shared by the concrete adapters, with validation
//! and a redacting `Debug` so tokens never reach logs.

use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, AdapterResult};

/// Configuration for one org-scoped adapter instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Base URL of the provider API, no trailing slash.
    pub base_url: String,

    /// Org-scoped access token.
    pub access_token: String,

    /// Connection settings.
    #[serde(default)]
    pub connection: ConnectionSettings,
}

impl AdapterConfig {
    /// Create a config with default connection settings.
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
            connection: ConnectionSettings::default(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AdapterResult<()> {
        if self.base_url.is_empty() {
            return Err(AdapterError::validation("base_url must not be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(AdapterError::validation(format!(
                "base_url '{}' must be an http(s) URL",
                self.base_url
            )));
        }
        if self.access_token.is_empty() {
            return Err(AdapterError::validation("access_token must not be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .field("connection", &self.connection)
            .finish()
    }
}

/// Timeouts for the underlying HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Per-request read timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
        }
    }
}
