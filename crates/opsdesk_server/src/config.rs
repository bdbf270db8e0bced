//! Environment-driven server configuration.
//!
//! # Responsibility
//! - Resolve bind address, database path and logging settings from
//!   `OPSDESK_*` variables, falling back to local-development defaults.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - Invalid values are reported, never silently replaced by defaults.

use opsdesk_core::{default_log_level, LogTarget};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const BIND_ENV: &str = "OPSDESK_BIND";
pub const DB_PATH_ENV: &str = "OPSDESK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "OPSDESK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "OPSDESK_LOG_DIR";

const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_DB_FILE_NAME: &str = "opsdesk.sqlite3";
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];

/// Invalid server setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBind { value: String, reason: String },
    InvalidLogLevel(String),
    InvalidLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBind { value, reason } => {
                write!(f, "{BIND_ENV}=`{value}` is not a socket address: {reason}")
            }
            Self::InvalidLogLevel(value) => write!(
                f,
                "{LOG_LEVEL_ENV}=`{value}` is not one of trace|debug|info|warn|error"
            ),
            Self::InvalidLogDir(reason) => write!(f, "{LOG_DIR_ENV}: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_target: LogTarget,
}

impl ServerConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let raw_bind = read(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = raw_bind
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::InvalidBind {
                value: raw_bind.clone(),
                reason: err.to_string(),
            })?;

        let db_path = read(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME));

        let log_level = match read(LOG_LEVEL_ENV) {
            Some(level) if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) => {
                level.to_ascii_lowercase()
            }
            Some(level) => return Err(ConfigError::InvalidLogLevel(level)),
            None => default_log_level().to_string(),
        };

        let log_target = match read(LOG_DIR_ENV) {
            Some(dir) => LogTarget::directory(&dir).map_err(ConfigError::InvalidLogDir)?,
            None => LogTarget::Stderr,
        };

        Ok(Self {
            bind,
            db_path,
            log_level,
            log_target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServerConfig, BIND_ENV, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use opsdesk_core::{default_log_level, LogTarget};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind.to_string(), "127.0.0.1:8000");
        assert_eq!(config.db_path, PathBuf::from("opsdesk.sqlite3"));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_target, LogTarget::Stderr);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[(BIND_ENV, "  "), (DB_PATH_ENV, "")]).unwrap();
        assert_eq!(config.bind.port(), 8000);
        assert_eq!(config.db_path, PathBuf::from("opsdesk.sqlite3"));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let dir = std::env::temp_dir();
        let dir_text = dir.to_str().unwrap();
        let config = config_from(&[
            (BIND_ENV, "0.0.0.0:9100"),
            (DB_PATH_ENV, "/var/lib/opsdesk/state.sqlite3"),
            (LOG_LEVEL_ENV, "WARN"),
            (LOG_DIR_ENV, dir_text),
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 9100);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/opsdesk/state.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_target, LogTarget::Directory(dir));
    }

    #[test]
    fn invalid_values_are_typed_errors() {
        assert!(matches!(
            config_from(&[(BIND_ENV, "localhost")]),
            Err(ConfigError::InvalidBind { .. })
        ));
        assert_eq!(
            config_from(&[(LOG_LEVEL_ENV, "verbose")]),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );
        assert!(matches!(
            config_from(&[(LOG_DIR_ENV, "relative/logs")]),
            Err(ConfigError::InvalidLogDir(_))
        ));
    }
}
