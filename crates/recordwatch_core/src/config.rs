//! Core configuration.
//!
//! # Responsibility
//! - Load settings from an optional TOML file.
//! - Apply environment overrides on top of the file.
//!
//! # Precedence
//! 1. Built-in defaults
//! 2. TOML file passed to [`CoreConfig::load`]
//! 3. `RECORDWATCH_DB_PATH` / `RECORDWATCH_LOG_LEVEL`
//!
//! # Example
//!
//! ```toml
//! db_path = "/var/lib/recordwatch/records.sqlite3"
//! log_level = "info"
//! log_dir = "/var/log/recordwatch"
//! address_sublist = "addressbook"
//! address_marker_field = "custentity_jj_address_changed"
//! ```

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DB_PATH_ENV: &str = "RECORDWATCH_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "RECORDWATCH_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "recordwatch.sqlite3";
const DEFAULT_ADDRESS_SUBLIST: &str = "addressbook";
const DEFAULT_ADDRESS_MARKER_FIELD: &str = "custentity_jj_address_changed";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file backing the record store.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory; file logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Sublist watched by the address-change handler.
    pub address_sublist: String,
    /// Boolean body field receiving the detection result.
    pub address_marker_field: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            address_sublist: DEFAULT_ADDRESS_SUBLIST.to_string(),
            address_marker_field: DEFAULT_ADDRESS_MARKER_FIELD.to_string(),
        }
    }
}

impl CoreConfig {
    /// Loads defaults, then `path` (if any), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses one TOML file; keys left out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db_path) = lookup(DB_PATH_ENV).filter(|value| !value.trim().is_empty()) {
            self.db_path = PathBuf::from(db_path.trim());
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|value| !value.trim().is_empty()) {
            self.log_level = level.trim().to_string();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.address_sublist.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "address_sublist cannot be empty".to_string(),
            ));
        }
        if self.address_marker_field.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "address_marker_field cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
