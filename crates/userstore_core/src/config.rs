//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Resolve datastore path, logging and request timeout settings.
//!
//! # Invariants
//! - Blank values are treated as unset.
//! - Resolution never panics; malformed values surface as `ConfigError`.

use crate::context::ExecutionScope;
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "USERSTORE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "USERSTORE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "USERSTORE_LOG_DIR";
pub const ENV_TIMEOUT_MS: &str = "USERSTORE_TIMEOUT_MS";

const DEFAULT_DB_FILE_NAME: &str = "userstore.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTimeout(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeout(value) => write!(
                f,
                "{ENV_TIMEOUT_MS} must be a positive integer of milliseconds, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl StoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|trimmed| !trimmed.is_empty())
        };

        let db_path = value(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        let log_level = value(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string());
        let request_timeout = value(ENV_TIMEOUT_MS)
            .map(|raw| match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
                _ => Err(ConfigError::InvalidTimeout(raw)),
            })
            .transpose()?;

        Ok(Self {
            db_path,
            log_level,
            log_dir: value(ENV_LOG_DIR),
            request_timeout,
        })
    }

    /// Builds a fresh execution scope honoring the configured timeout.
    pub fn request_scope(&self) -> ExecutionScope {
        match self.request_timeout {
            Some(timeout) => ExecutionScope::with_timeout(timeout),
            None => ExecutionScope::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_TIMEOUT_MS};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.db_path.ends_with("userstore.sqlite3"));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.request_timeout, None);
        assert!(config.request_scope().deadline().is_none());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config =
            StoreConfig::from_lookup(lookup(&[(ENV_LOG_DIR, "   "), (ENV_TIMEOUT_MS, "")]))
                .unwrap();
        assert_eq!(config.log_dir, None);
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn explicit_values_are_trimmed_and_parsed() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, " /tmp/users.db "),
            (ENV_TIMEOUT_MS, "250"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/users.db"));
        assert_eq!(config.request_timeout, Some(Duration::from_millis(250)));
        assert!(config.request_scope().deadline().is_some());
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        for raw in ["soon", "0", "-5"] {
            let err = StoreConfig::from_lookup(lookup(&[(ENV_TIMEOUT_MS, raw)])).unwrap_err();
            assert_eq!(err, ConfigError::InvalidTimeout(raw.to_string()));
        }
    }
}
