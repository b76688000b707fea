//! Connection configuration for the index backend.

use serde::{Deserialize, Serialize};

/// Default backend host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default backend port.
pub const DEFAULT_PORT: u16 = 9200;

/// Connection settings for the index backend.
///
/// Changing the configuration at runtime reconstructs the backend client; see
/// `SearchService::configure` in the `live-search` crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend host name.
    pub host: String,
    /// Backend port.
    pub port: u16,
    /// Use HTTPS instead of HTTP.
    pub secure: bool,
    /// Log every write acknowledgment at info level.
    pub debug: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            secure: false,
            debug: false,
        }
    }
}

/// Partial configuration. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfigUpdate {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default)]
    pub debug: Option<bool>,
}

impl BackendConfig {
    /// The base URL of the backend, e.g. `http://localhost:9200`.
    pub fn url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Return a copy with every field set in `update` overridden.
    pub fn merged(&self, update: BackendConfigUpdate) -> Self {
        Self {
            host: update.host.unwrap_or_else(|| self.host.clone()),
            port: update.port.unwrap_or(self.port),
            secure: update.secure.unwrap_or(self.secure),
            debug: update.debug.unwrap_or(self.debug),
        }
    }
}
