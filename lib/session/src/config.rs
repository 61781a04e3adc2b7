//! Client configuration, loaded via the `config` crate from `INSTAR__*`
//! environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Session client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the dashboard API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Where the session record is persisted.
    #[serde(default = "default_token_store_path")]
    pub token_store_path: PathBuf,

    #[serde(default)]
    pub liveness: LivenessConfig,
}

/// Timing of the session liveness monitor.
#[derive(Debug, Clone, Deserialize)]
pub struct LivenessConfig {
    /// Seconds between liveness ticks.
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Refresh once the access token has fewer than this many seconds left.
    #[serde(default = "default_refresh_margin_seconds")]
    pub refresh_margin_seconds: i64,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_token_store_path() -> PathBuf {
    PathBuf::from("instar-session.json")
}

fn default_poll_interval_seconds() -> u64 {
    60
}

fn default_refresh_margin_seconds() -> i64 {
    300
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval_seconds(),
            refresh_margin_seconds: default_refresh_margin_seconds(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token_store_path: default_token_store_path(),
            liveness: LivenessConfig::default(),
        }
    }
}

impl LivenessConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }

    #[must_use]
    pub fn refresh_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.refresh_margin_seconds)
    }
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::with_prefix("INSTAR"))
    }

    fn from_environment(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source.prefix_separator("__").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
