//! Process configuration for the store and logging.
//!
//! # Responsibility
//! - Read store path and logging settings from environment variables.
//! - Open the configured store.
//!
//! # Invariants
//! - Absent `SAEP_DB_PATH` means a private in-memory store.
//! - Absent `SAEP_LOG_DIR` means logging is left uninitialized.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, parse_level, LoggingError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "SAEP_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "SAEP_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "SAEP_LOG_DIR";

#[derive(Debug)]
pub enum ConfigError {
    InvalidLogLevel(LoggingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(err) => write!(f, "invalid {LOG_LEVEL_VAR}: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLogLevel(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let log_level = match read(LOG_LEVEL_VAR) {
            Some(level) => parse_level(&level).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };

        Ok(Self {
            db_path: read(DB_PATH_VAR).map(PathBuf::from),
            log_level,
            log_dir: read(LOG_DIR_VAR).map(PathBuf::from),
        })
    }

    /// Opens the configured store with migrations applied.
    pub fn open_store(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, DB_PATH_VAR, LOG_LEVEL_VAR};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_memory_store_and_default_level() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_path, None);
        assert_eq!(config.log_dir, None);
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn values_are_read_and_normalized() {
        let config = StoreConfig::from_lookup(lookup(&[
            (DB_PATH_VAR, "/tmp/saep.db"),
            (LOG_LEVEL_VAR, " Warning "),
        ]))
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/saep.db")));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn unknown_level_is_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[(LOG_LEVEL_VAR, "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }

    #[test]
    fn open_store_with_file_path_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saep.db");
        let config = StoreConfig {
            db_path: Some(path.clone()),
            log_level: "info",
            log_dir: None,
        };
        config.open_store().unwrap();
        assert!(path.exists());
    }
}
