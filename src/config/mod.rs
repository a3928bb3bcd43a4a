//! Configuration management
//!
//! This module handles loading and parsing configuration for sessionctl.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Session backend configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Identity of the signed-in user
    #[serde(default)]
    pub auth: AuthConfig,
    /// Session cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Session backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL the `/api/session/*` paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Signed-in user
///
/// The backend manages authentication; the client only needs the email it
/// sends as the requester of activation commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub email: Option<String>,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds before a cached snapshot is considered stale
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached snapshots
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

fn default_ttl() -> u64 {
    60
}

fn default_max_capacity() -> u64 {
    1_000
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - SESSIONCTL_SERVER_BASE_URL
    /// - SESSIONCTL_SERVER_TIMEOUT_SECONDS
    /// - SESSIONCTL_AUTH_EMAIL
    /// - SESSIONCTL_CACHE_TTL_SECONDS
    /// - SESSIONCTL_CACHE_MAX_CAPACITY
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the client cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.base_url must not be empty".to_string(),
            ));
        }
        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "cache.ttl_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("SESSIONCTL_SERVER_BASE_URL") {
            self.server.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("SESSIONCTL_SERVER_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.server.timeout_seconds = timeout;
            }
        }

        if let Ok(email) = std::env::var("SESSIONCTL_AUTH_EMAIL") {
            self.auth.email = Some(email);
        }

        if let Ok(ttl) = std::env::var("SESSIONCTL_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }
        if let Ok(capacity) = std::env::var("SESSIONCTL_CACHE_MAX_CAPACITY") {
            if let Ok(capacity) = capacity.parse::<u64>() {
                self.cache.max_capacity = capacity;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches SESSIONCTL_* variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: [&str; 5] = [
    "SESSIONCTL_SERVER_BASE_URL",
    "SESSIONCTL_SERVER_TIMEOUT_SECONDS",
    "SESSIONCTL_AUTH_EMAIL",
    "SESSIONCTL_CACHE_TTL_SECONDS",
    "SESSIONCTL_CACHE_MAX_CAPACITY",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}
