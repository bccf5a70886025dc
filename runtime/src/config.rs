//! Configuration for the index synchronizer.
//!
//! Configuration is loaded either from a TOML document or from environment
//! variables, then validated before anything is wired up.
//!
//! | Key                                | Environment              | Default          |
//! |------------------------------------|--------------------------|------------------|
//! | `search.endpoint`                  | `SEARCH_ENDPOINT`        | (required)       |
//! | `search.username`                  | `SEARCH_USERNAME`        | none             |
//! | `search.password`                  | `SEARCH_PASSWORD`        | none             |
//! | `search.timeout_secs`              | `SEARCH_TIMEOUT_SECS`    | `10`             |
//! | `indices.screenings_index`         | `SCREENINGS_INDEX`       | `screenings`     |
//! | `indices.screening_index_prefix`   | `SCREENING_INDEX_PREFIX` | `screening-`     |
//! | `indices.article_screening_field`  | `ARTICLE_SCREENING_FIELD`| `screeningId`    |
//! | `observability.log_level`          | `LOG_LEVEL`              | `info`           |
//! | `observability.metrics_enabled`    | `METRICS_ENABLED`        | `true`           |
//! | `observability.metrics_addr`       | `METRICS_ADDR`           | `0.0.0.0:9090`   |
//!
//! # Example
//!
//! ```no_run
//! use listing_sync_runtime::config::SyncConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::from_env()?;
//! println!("Indexing into {}", config.search.endpoint);
//!
//! let config = SyncConfig::from_toml_str(r#"
//!     [search]
//!     endpoint = "http://localhost:9200"
//! "#)?;
//! assert_eq!(config.indices.screenings_index, "screenings");
//! # Ok(())
//! # }
//! ```

use listing_sync_core::store::index_name_violation;
use listing_sync_projections::mapping::{
    DEFAULT_ARTICLE_SCREENING_FIELD, DEFAULT_SCREENING_INDEX_PREFIX,
};
use listing_sync_projections::screening::DEFAULT_SCREENINGS_INDEX;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// Environment variable could not be parsed
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        /// Variable name
        key: String,
        /// Raw value
        value: String,
        /// Parse failure
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    Validation(String),

    /// Failed to parse a configuration document
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Failed to read a configuration file
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        /// File path
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Search engine connection settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the search engine
    pub endpoint: String,
    /// Basic auth username
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl SearchConfig {
    /// Validate search configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Validation("search.endpoint cannot be empty".to_string()));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "search.endpoint must be an http or https URL, got '{}'",
                self.endpoint
            )));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::Validation(
                "search.username and search.password must be set together".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation("search.timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Basic auth credentials, if configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username.as_deref().zip(self.password.as_deref())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            username: None,
            password: None,
            timeout_secs: 10,
        }
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Index naming settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicesConfig {
    /// Shared index holding one document per screening
    pub screenings_index: String,
    /// Prefix of each screening's dedicated index
    pub screening_index_prefix: String,
    /// Article attribute naming the owning screening
    pub article_screening_field: String,
}

impl IndicesConfig {
    /// Validate index configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screenings_index.is_empty() {
            return Err(ConfigError::Validation(
                "indices.screenings_index cannot be empty".to_string(),
            ));
        }
        if self.screenings_index != self.screenings_index.to_lowercase() {
            return Err(ConfigError::Validation(format!(
                "indices.screenings_index must be lowercase, got '{}'",
                self.screenings_index
            )));
        }
        if let Some(reason) = index_name_violation(&self.screenings_index) {
            return Err(ConfigError::Validation(format!(
                "indices.screenings_index '{}' is not a valid index name: {reason}",
                self.screenings_index
            )));
        }
        if self.screening_index_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "indices.screening_index_prefix cannot be empty".to_string(),
            ));
        }
        if let Some(reason) = index_name_violation(&self.screening_index_prefix) {
            return Err(ConfigError::Validation(format!(
                "indices.screening_index_prefix '{}' is not a valid index name start: {reason}",
                self.screening_index_prefix
            )));
        }
        // A dedicated index must never be named like the shared list index
        if self.screenings_index.starts_with(&self.screening_index_prefix.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "indices.screenings_index '{}' collides with prefix '{}'",
                self.screenings_index, self.screening_index_prefix
            )));
        }
        if self.article_screening_field.is_empty() {
            return Err(ConfigError::Validation(
                "indices.article_screening_field cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for IndicesConfig {
    fn default() -> Self {
        Self {
            screenings_index: DEFAULT_SCREENINGS_INDEX.to_string(),
            screening_index_prefix: DEFAULT_SCREENING_INDEX_PREFIX.to_string(),
            article_screening_field: DEFAULT_ARTICLE_SCREENING_FIELD.to_string(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Enable the Prometheus exporter
    pub metrics_enabled: bool,
    /// Address the Prometheus exporter listens on
    pub metrics_addr: SocketAddr,
}

impl ObservabilityConfig {
    /// Validate observability configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "invalid log_level: {}. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
        }
    }
}

/// Index synchronizer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Search engine connection
    pub search: SearchConfig,
    /// Index naming
    pub indices: IndicesConfig,
    /// Logging and metrics
    pub observability: ObservabilityConfig,
}

impl SyncConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if `SEARCH_ENDPOINT` is missing, a variable cannot be
    /// parsed, or the result is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`SyncConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.search.endpoint = lookup("SEARCH_ENDPOINT")
            .ok_or_else(|| ConfigError::EnvVarNotSet("SEARCH_ENDPOINT".to_string()))?;
        config.search.username = lookup("SEARCH_USERNAME");
        config.search.password = lookup("SEARCH_PASSWORD");
        if let Some(value) = lookup("SEARCH_TIMEOUT_SECS") {
            config.search.timeout_secs = parse_var("SEARCH_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = lookup("SCREENINGS_INDEX") {
            config.indices.screenings_index = value;
        }
        if let Some(value) = lookup("SCREENING_INDEX_PREFIX") {
            config.indices.screening_index_prefix = value;
        }
        if let Some(value) = lookup("ARTICLE_SCREENING_FIELD") {
            config.indices.article_screening_field = value;
        }

        if let Some(value) = lookup("LOG_LEVEL") {
            config.observability.log_level = value;
        }
        if let Some(value) = lookup("METRICS_ENABLED") {
            config.observability.metrics_enabled = parse_var("METRICS_ENABLED", &value)?;
        }
        if let Some(value) = lookup("METRICS_ADDR") {
            config.observability.metrics_addr = parse_var("METRICS_ADDR", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns error if the document cannot be parsed or is invalid
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(document).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or is invalid
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&document)
    }

    /// Validate entire configuration
    ///
    /// # Errors
    ///
    /// Returns error if any configuration section is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate()?;
        self.indices.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
