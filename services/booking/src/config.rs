use std::path::PathBuf;
use std::time::Duration;

use maitred_id::RestaurantId;
use maitred_seating::MaitreDError;
use thiserror::Error;

use crate::admission::{AdmissionPolicy, BackoffPolicy};
use crate::db::DbConfig;
use crate::registry::RestaurantRegistry;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid restaurants file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("restaurant {id} is misconfigured: {source}")]
    InvalidRestaurant {
        id: RestaurantId,
        #[source]
        source: MaitreDError,
    },

    #[error("restaurant {0} is defined more than once")]
    DuplicateRestaurant(RestaurantId),

    #[error("MAITRED_RESTAURANTS is not set; point it at a restaurants TOML file")]
    NoRestaurants,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub database: DbConfig,
    pub restaurants_path: Option<PathBuf>,
    pub admission: AdmissionPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`; missing or unparsable values fall
    /// back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_level = lookup("MAITRED_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let restaurants_path = lookup("MAITRED_RESTAURANTS").map(PathBuf::from);

        let defaults = AdmissionPolicy::default();
        let max_attempts = lookup("MAITRED_ADMISSION_MAX_ATTEMPTS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_attempts);
        let timeout = lookup("MAITRED_ADMISSION_TIMEOUT_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout);
        let backoff_base = lookup("MAITRED_ADMISSION_BACKOFF_BASE_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.backoff.base);

        Self {
            log_level,
            database: DbConfig::from_lookup(&lookup),
            restaurants_path,
            admission: AdmissionPolicy {
                max_attempts,
                timeout,
                backoff: BackoffPolicy {
                    base: backoff_base,
                    ..defaults.backoff
                },
            },
        }
    }

    /// Loads the restaurants named by `MAITRED_RESTAURANTS`.
    pub fn load_restaurants(&self) -> Result<RestaurantRegistry, ConfigError> {
        let path = self
            .restaurants_path
            .as_deref()
            .ok_or(ConfigError::NoRestaurants)?;
        RestaurantRegistry::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.admission.max_attempts, 5);
        assert_eq!(config.admission.timeout, Duration::from_millis(5000));
        assert_eq!(config.admission.backoff.base, Duration::from_millis(10));
        assert!(config.restaurants_path.is_none());
        assert!(matches!(
            config.load_restaurants(),
            Err(ConfigError::NoRestaurants)
        ));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("MAITRED_LOG_LEVEL", "debug"),
            ("MAITRED_RESTAURANTS", "/etc/maitred/restaurants.toml"),
            ("MAITRED_ADMISSION_MAX_ATTEMPTS", "9"),
            ("MAITRED_ADMISSION_TIMEOUT_MS", "250"),
            ("MAITRED_ADMISSION_BACKOFF_BASE_MS", "3"),
            ("DB_MAX_CONNECTIONS", "4"),
        ]);
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.restaurants_path.as_deref(),
            Some(std::path::Path::new("/etc/maitred/restaurants.toml"))
        );
        assert_eq!(config.admission.max_attempts, 9);
        assert_eq!(config.admission.timeout, Duration::from_millis(250));
        assert_eq!(config.admission.backoff.base, Duration::from_millis(3));
        assert_eq!(config.database.max_connections, 4);
    }

    #[test]
    fn test_missing_restaurants_file() {
        let config = config(&[("MAITRED_RESTAURANTS", "/nonexistent/restaurants.toml")]);
        assert!(matches!(
            config.load_restaurants(),
            Err(ConfigError::Io { .. })
        ));
    }
}
