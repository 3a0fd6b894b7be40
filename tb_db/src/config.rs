//! ABOUTME: Database configuration with validation and environment loading
//! ABOUTME: Controls the SQLite path, pool sizing, journal mode, and timeouts

use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use validator::Validate;

use tb_core::{Error, Result};

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file, created if missing
    #[validate(length(min = 1))]
    pub path: String,
    #[validate(range(min = 1, max = 100))]
    pub pool_size: u32,
    pub sqlite_wal: bool,
    #[validate(range(min = 1, max = 300))]
    pub busy_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "tabula.db".to_string(),
            pool_size: 10,
            sqlite_wal: true,
            busy_timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Load configuration from `config/*` files and `TB`-prefixed
    /// environment variables, then validate it
    pub fn load() -> Result<Self> {
        let config = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local overrides (gitignored)
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("TB").separator("__"))
            .build()?
            .try_deserialize::<DatabaseConfig>()?;

        config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// A configuration pointing at `path`, defaults elsewhere
    pub fn at_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DatabaseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pool_size, 10);
        assert!(config.sqlite_wal);
    }

    #[test]
    fn test_at_path_overrides_only_the_path() {
        let config = DatabaseConfig::at_path("/tmp/test.db");
        assert_eq!(config.path, "/tmp/test.db");
        assert_eq!(config.pool_size, DatabaseConfig::default().pool_size);
    }

    #[test]
    fn test_out_of_range_values_fail_validation() {
        let config = DatabaseConfig {
            pool_size: 0,
            ..DatabaseConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DatabaseConfig {
            path: String::new(),
            ..DatabaseConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
