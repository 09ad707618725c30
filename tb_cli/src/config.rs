//! CLI configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::str::FromStr;
use tournament_bracket::db::DatabaseConfig;

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// PostgreSQL via `DATABASE_URL`
    Postgres,
    /// Process-local store, discarded on exit
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreKind::Postgres),
            "memory" | "mem" => Ok(StoreKind::Memory),
            other => Err(ConfigError::Invalid {
                var: "TB_STORE".to_string(),
                reason: format!("Unknown store '{other}', expected 'postgres' or 'memory'"),
            }),
        }
    }
}

/// Complete CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Storage backend
    pub store: StoreKind,
    /// Database configuration, used with `StoreKind::Postgres`
    pub database: DatabaseConfig,
}

impl CliConfig {
    /// Load configuration from environment variables
    ///
    /// Pool settings and `DATABASE_URL` come from [`DatabaseConfig::from_env`].
    ///
    /// # Arguments
    ///
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `memory_override` - Force the in-memory store (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if `TB_STORE` holds an unknown backend
    pub fn from_env(
        database_url_override: Option<String>,
        memory_override: bool,
    ) -> Result<Self, ConfigError> {
        let store = if memory_override {
            StoreKind::Memory
        } else {
            match std::env::var("TB_STORE") {
                Ok(value) => value.parse()?,
                Err(_) => StoreKind::Postgres,
            }
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database = database.with_url(url);
        }

        Ok(CliConfig { store, database })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store == StoreKind::Memory {
            return Ok(());
        }

        let url = &self.database.database_url;
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL".to_string(),
                reason: "Must be a postgres:// or postgresql:// URL".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.database.connection_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_CONNECTION_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postgres_config(database_url: &str) -> CliConfig {
        CliConfig {
            store: StoreKind::Postgres,
            database: DatabaseConfig::development().with_url(database_url),
        }
    }

    #[test]
    fn test_store_kind_parse() {
        assert_eq!("Postgres".parse::<StoreKind>().unwrap(), StoreKind::Postgres);
        assert_eq!("memory".parse::<StoreKind>().unwrap(), StoreKind::Memory);

        let err = "sqlite".parse::<StoreKind>().unwrap_err();
        assert!(err.to_string().contains("TB_STORE"));
    }

    #[test]
    fn test_memory_override_wins() {
        let config = CliConfig::from_env(Some("postgres://x/y".to_string()), true).unwrap();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.database.database_url, "postgres://x/y");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_url_override_keeps_pool_settings_from_env() {
        let config = CliConfig::from_env(Some("postgres://db/cup".to_string()), false).unwrap();
        assert_eq!(
            config.database,
            DatabaseConfig::from_env().with_url("postgres://db/cup")
        );
    }

    #[test]
    fn test_config_validation_bad_url() {
        let err = postgres_config("mysql://localhost/db").validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DATABASE_URL"));

        assert!(postgres_config("postgresql://localhost/db").validate().is_ok());
    }

    #[test]
    fn test_config_validation_pool_sizes() {
        let mut config = postgres_config("postgres://localhost/db");
        config.database.min_connections = 20;
        config.database.max_connections = 5;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_MIN_CONNECTIONS"));
    }
}
