//! Environment-driven configuration.
//!
//! All knobs are read once at startup; nothing re-reads the environment per
//! request. The store connection parameters are consumed opaquely — the
//! gateway does not choose or validate them.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DB_PATH: &str = "data/strokewatch.db";
const DEFAULT_MODEL_PATH: &str = "models/logistic_regression.json";
const DEFAULT_CONNECT_ATTEMPTS: u32 = 10;
const DEFAULT_CONNECT_DELAY_SECS: u64 = 45;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP surface binds to (`STROKEWATCH_BIND_ADDR`).
    pub bind_addr: SocketAddr,
    /// Path of the model artifact (`STROKEWATCH_MODEL_PATH`).
    pub model_path: PathBuf,
    pub store: StoreConfig,
}

/// Store connection parameters.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database path (`STROKEWATCH_DB_PATH`).
    pub path: PathBuf,
    /// Startup connection attempts (`STROKEWATCH_DB_CONNECT_ATTEMPTS`).
    pub connect_attempts: u32,
    /// Fixed delay between attempts (`STROKEWATCH_DB_CONNECT_DELAY_SECS`).
    pub connect_delay: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            connect_delay: Duration::from_secs(DEFAULT_CONNECT_DELAY_SECS),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.parse().expect("Valid default address"),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Read the configuration from the environment, falling back to defaults
    /// for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_parse("STROKEWATCH_BIND_ADDR").unwrap_or(defaults.bind_addr),
            model_path: env_non_empty("STROKEWATCH_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            store: StoreConfig {
                path: env_non_empty("STROKEWATCH_DB_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.store.path),
                connect_attempts: env_parse("STROKEWATCH_DB_CONNECT_ATTEMPTS")
                    .unwrap_or(defaults.store.connect_attempts),
                connect_delay: env_parse("STROKEWATCH_DB_CONNECT_DELAY_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.store.connect_delay),
            },
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env_non_empty(name).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.store.connect_attempts, 10);
        assert_eq!(config.store.connect_delay, Duration::from_secs(45));
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }
}
