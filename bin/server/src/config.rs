//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`TokenConfig`] for token signing and lifetimes.

use instar_platform_access::TokenConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL database connection URL.
    /// Without one, users live in memory and vanish on restart.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Origin allowed to call the API from a browser.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Token signing configuration.
    pub token: TokenConfig,

    /// Admin account created at startup if its email is unknown.
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials of the initial admin account.
#[derive(Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_display_name")]
    pub display_name: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:9000".to_string()
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_admin_display_name() -> String {
    "Administrator".to_string()
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
