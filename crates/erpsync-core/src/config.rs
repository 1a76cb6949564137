//! Configuration module for erpsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::RetryPolicy;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for erpsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub connectivity: ConnectivityConfig,
    pub logging: LoggingConfig,
}

/// Remote ERP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the ERP HTTP gateway, e.g. `https://erp.example.com/api`.
    pub base_url: String,
    /// Bearer token sent with every request, if the gateway requires one.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Local store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

/// Sync queue replay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Failed attempts after which an item is parked. `0` disables parking.
    pub max_attempts: u32,
    /// Backoff after the first failure, in seconds.
    pub backoff_base_secs: u64,
    /// Upper bound for the backoff, in seconds.
    pub backoff_max_secs: u64,
}

/// Connectivity monitoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Seconds between reachability checks.
    pub check_interval_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/erpsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("erpsync")
            .join("config.yaml")
    }

    /// Retry policy derived from the `queue` section.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.queue)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            api_token: None,
            timeout_secs: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("erpsync");
        Self {
            path: data_dir.join("erpsync.db"),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            backoff_base_secs: 30,
            backoff_max_secs: 3600,
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 15,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Longest backoff representable in a retry policy (30 days).
const MAX_BACKOFF_SECS: u64 = 30 * 24 * 3600;

impl From<&QueueConfig> for RetryPolicy {
    fn from(queue: &QueueConfig) -> Self {
        let seconds = |secs: u64| Duration::seconds(secs.min(MAX_BACKOFF_SECS) as i64);
        Self {
            max_attempts: queue.max_attempts,
            base_delay: seconds(queue.backoff_base_secs),
            max_delay: seconds(queue.backoff_max_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"queue.backoff_base_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- gateway ---
        let base_url = self.gateway.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "gateway.base_url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.gateway.base_url),
            });
        }
        if self.gateway.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "gateway.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if matches!(&self.gateway.api_token, Some(token) if token.trim().is_empty()) {
            errors.push(ValidationError {
                field: "gateway.api_token".into(),
                message: "must not be blank when set".into(),
            });
        }

        // --- database ---
        if self.database.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "database.path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- queue ---
        if self.queue.backoff_base_secs == 0 {
            errors.push(ValidationError {
                field: "queue.backoff_base_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.queue.backoff_max_secs < self.queue.backoff_base_secs {
            errors.push(ValidationError {
                field: "queue.backoff_max_secs".into(),
                message: format!(
                    "backoff_max_secs ({}) must not be below backoff_base_secs ({})",
                    self.queue.backoff_max_secs, self.queue.backoff_base_secs
                ),
            });
        }
        if self.queue.backoff_max_secs > MAX_BACKOFF_SECS {
            errors.push(ValidationError {
                field: "queue.backoff_max_secs".into(),
                message: format!("must not exceed {MAX_BACKOFF_SECS}"),
            });
        }

        // --- connectivity ---
        if self.connectivity.check_interval_secs == 0 {
            errors.push(ValidationError {
                field: "connectivity.check_interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use erpsync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .gateway_base_url("https://erp.example.com/api")
///     .queue_max_attempts(5)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- gateway ---

    pub fn gateway_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.gateway.base_url = url.into();
        self
    }

    pub fn gateway_api_token(mut self, token: impl Into<String>) -> Self {
        self.config.gateway.api_token = Some(token.into());
        self
    }

    pub fn gateway_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.gateway.timeout_secs = seconds;
        self
    }

    // --- database ---

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.config.database.path = path;
        self
    }

    // --- queue ---

    pub fn queue_max_attempts(mut self, attempts: u32) -> Self {
        self.config.queue.max_attempts = attempts;
        self
    }

    pub fn queue_backoff_base_secs(mut self, seconds: u64) -> Self {
        self.config.queue.backoff_base_secs = seconds;
        self
    }

    pub fn queue_backoff_max_secs(mut self, seconds: u64) -> Self {
        self.config.queue.backoff_max_secs = seconds;
        self
    }

    // --- connectivity ---

    pub fn connectivity_check_interval_secs(mut self, seconds: u64) -> Self {
        self.config.connectivity.check_interval_secs = seconds;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
