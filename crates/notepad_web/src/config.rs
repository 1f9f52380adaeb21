//! Server configuration resolved from `NOTEPAD_*` environment variables.
//!
//! # Invariants
//! - Blank values fall back to defaults.
//! - `log_dir` is always absolute.

use notepad_core::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:37240";
const DB_FILE_NAME: &str = "notepad.sqlite3";
const LOG_DIR_NAME: &str = "notepad-logs";
const BLOB_DIR_NAME: &str = "notepad-blobs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub blob_dir: PathBuf,
    /// Origin used to build public blob URLs.
    pub public_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBindAddr { value: String, message: String },
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBindAddr { value, message } => {
                write!(f, "invalid NOTEPAD_BIND_ADDR `{value}`: {message}")
            }
            Self::RelativeLogDir(value) => {
                write!(f, "NOTEPAD_LOG_DIR must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup` instead of the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let temp_dir = std::env::temp_dir();

        let bind_raw = read("NOTEPAD_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::InvalidBindAddr {
                value: bind_raw.clone(),
                message: err.to_string(),
            })?;

        let log_dir = read("NOTEPAD_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| temp_dir.join(LOG_DIR_NAME));
        if !log_dir.is_absolute() {
            return Err(ConfigError::RelativeLogDir(log_dir.display().to_string()));
        }

        Ok(Self {
            db_path: read("NOTEPAD_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| temp_dir.join(DB_FILE_NAME)),
            bind_addr,
            log_level: read("NOTEPAD_LOG_LEVEL")
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir,
            blob_dir: read("NOTEPAD_BLOB_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| temp_dir.join(BLOB_DIR_NAME)),
            public_base_url: read("NOTEPAD_PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://{bind_addr}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServerConfig, DEFAULT_BIND_ADDR};
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let env = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_for_missing_and_blank_values() {
        let config = config(&[("NOTEPAD_DB_PATH", "   ")]).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(config.db_path.ends_with("notepad.sqlite3"));
        assert!(config.log_dir.is_absolute());
        assert_eq!(config.public_base_url, format!("http://{DEFAULT_BIND_ADDR}"));
    }

    #[test]
    fn explicit_values_win() {
        let config = config(&[
            ("NOTEPAD_BIND_ADDR", "0.0.0.0:8080"),
            ("NOTEPAD_LOG_LEVEL", "warn"),
            ("NOTEPAD_PUBLIC_BASE_URL", "https://notes.example.com"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.public_base_url, "https://notes.example.com");
    }

    #[test]
    fn invalid_bind_addr_and_relative_log_dir_fail() {
        assert!(matches!(
            config(&[("NOTEPAD_BIND_ADDR", "localhost")]),
            Err(ConfigError::InvalidBindAddr { .. })
        ));
        assert!(matches!(
            config(&[("NOTEPAD_LOG_DIR", "logs")]),
            Err(ConfigError::RelativeLogDir(_))
        ));
    }
}
