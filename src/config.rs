//! Run configuration: database connection, input locations and failure policy
//!
//! Loaded from a TOML file, then overridden from the environment:
//!
//! ```toml
//! [database]
//! backend = "duckdb"
//! path = "sparkify.duckdb"
//!
//! [data]
//! song_data = "data/song_data"
//! log_data = "data/log_data"
//!
//! [pipeline]
//! on_error = "halt"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::FailurePolicy;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "etl.toml";

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::Read { path, .. } => format!(
                "{self}\n\nHint: Pass --config <file> or create {} in the working directory.",
                path.display()
            ),
            ConfigError::InvalidValue { key, .. } if key.starts_with("SONGPLAY_") => {
                format!("{self}\n\nHint: Check the {key} environment variable.")
            }
            _ => self.to_string(),
        }
    }
}

/// Target database engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    DuckDb,
    Postgres,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::DuckDb => write!(f, "duckdb"),
            Backend::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "duckdb" => Ok(Backend::DuckDb),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            _ => Err(format!("unknown backend '{s}'. Valid: duckdb, postgres")),
        }
    }
}

/// Connection settings for the target database
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub backend: Backend,
    /// Database file (DuckDB only)
    pub path: PathBuf,
    pub host: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub port: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            backend: Backend::DuckDb,
            path: PathBuf::from("sparkify.duckdb"),
            host: "127.0.0.1".to_string(),
            dbname: "sparkifydb".to_string(),
            user: "student".to_string(),
            password: "student".to_string(),
            port: 5432,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("backend", &self.backend)
            .field("path", &self.path)
            .field("host", &self.host)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"***")
            .field("port", &self.port)
            .finish()
    }
}

impl ConnectionConfig {
    /// Render a libpq key/value connection string
    pub fn postgres_connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            quote_conninfo(&self.host),
            self.port,
            quote_conninfo(&self.dbname),
            quote_conninfo(&self.user),
            quote_conninfo(&self.password),
        )
    }
}

fn quote_conninfo(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Input directories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    /// File extension matched by the locator
    pub extension: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            song_data: PathBuf::from("data/song_data"),
            log_data: PathBuf::from("data/log_data"),
            extension: "json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub on_error: FailurePolicy,
}

/// Complete run configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub database: ConnectionConfig,
    pub data: DataConfig,
    pub pipeline: PipelineSettings,
}

impl EtlConfig {
    /// Parse TOML text without applying environment overrides
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load a config file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content, path)?;
        config.apply_env()?;
        tracing::debug!(path = %path.display(), database = ?config.database, "Loaded configuration");
        Ok(config)
    }

    /// Load the given file, else `etl.toml` if present, else defaults
    ///
    /// Environment overrides apply in every case.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            return Self::load(default_path);
        }

        tracing::debug!("No config file, using defaults");
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `SONGPLAY_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db = &mut self.database;

        if let Some(value) = lookup("SONGPLAY_DB_BACKEND") {
            db.backend = value.parse().map_err(|reason| ConfigError::InvalidValue {
                key: "SONGPLAY_DB_BACKEND".to_string(),
                value: value.clone(),
                reason,
            })?;
        }
        if let Some(value) = lookup("SONGPLAY_DB_PATH") {
            db.path = PathBuf::from(value);
        }
        if let Some(value) = lookup("SONGPLAY_DB_HOST") {
            db.host = value;
        }
        if let Some(value) = lookup("SONGPLAY_DB_NAME") {
            db.dbname = value;
        }
        if let Some(value) = lookup("SONGPLAY_DB_USER") {
            db.user = value;
        }
        if let Some(value) = lookup("SONGPLAY_DB_PASSWORD") {
            db.password = value;
        }
        if let Some(value) = lookup("SONGPLAY_DB_PORT") {
            db.port = value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: "SONGPLAY_DB_PORT".to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(())
    }
}
