//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `kinship.yaml`. This module defines
//! strongly-typed structs that mirror the YAML structure, and provides a
//! loader that reads, applies environment overrides, and validates the file.

use std::path::Path;
use std::time::Duration;

use kinship_log::PostgresConfig;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is out of range or missing.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// All fields have defaults suitable for a local run against the in-memory
/// event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KinshipConfig {
    /// Event log backend and connection settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Clone resolver limits.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KinshipConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `DATABASE_URL` overrides `storage.postgres_url` and selects the
    ///   `postgres` backend
    /// - `KINSHIP_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse_with(yaml, |key| std::env::var(key).ok())
    }

    /// Parse configuration from a YAML string, reading overrides through
    /// `env` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`KinshipConfig::parse`].
    pub fn parse_with(
        yaml: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_overrides(env);
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides looked up through `env`.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(url) = env("DATABASE_URL") {
            self.storage.postgres_url = url;
            self.storage.backend = StorageBackend::Postgres;
        }
        if let Some(level) = env("KINSHIP_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.max_clone_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "resolver.max_clone_depth",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.storage.query_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "storage.query_timeout_ms",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid {
                field: "storage.max_connections",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.storage.backend == StorageBackend::Postgres && self.storage.postgres_url.is_empty()
        {
            return Err(ConfigError::Invalid {
                field: "storage.postgres_url",
                reason: "required when storage.backend is postgres".to_owned(),
            });
        }
        Ok(())
    }
}

/// Which event log store to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process log; contents are lost on exit.
    #[default]
    Memory,
    /// `PostgreSQL` `events` table.
    Postgres,
}

/// Event log configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StorageBackend,

    /// `PostgreSQL` connection URL.
    #[serde(default)]
    pub postgres_url: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Idle connection timeout in milliseconds.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Deadline for every event log query in milliseconds.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl StorageConfig {
    /// Pool settings for [`kinship_log::PostgresPool::connect`].
    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig::new(&self.postgres_url)
            .with_max_connections(self.max_connections)
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .with_idle_timeout(Duration::from_millis(self.idle_timeout_ms))
            .with_query_timeout(Duration::from_millis(self.query_timeout_ms))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            postgres_url: String::new(),
            max_connections: default_max_connections(),
            connect_timeout_ms: default_connect_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

/// Clone resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolverConfig {
    /// Maximum number of clone links followed from any entity. Deeper
    /// chains are reported as cycles.
    #[serde(default = "default_max_clone_depth")]
    pub max_clone_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_clone_depth: default_max_clone_depth(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` string). `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout_ms() -> u64 {
    5_000
}

const fn default_idle_timeout_ms() -> u64 {
    300_000
}

const fn default_query_timeout_ms() -> u64 {
    2_000
}

const fn default_max_clone_depth() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_owned()
}
