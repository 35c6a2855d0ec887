//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                    | Default              |
//! |-----------------------------|----------------------|
//! | `BAZAAR_HOST`               | `0.0.0.0`            |
//! | `BAZAAR_PORT`               | `8080`               |
//! | `BAZAAR_DB_PATH`            | `./data/bazaar.db`   |
//! | `BAZAAR_DB_MAX_CONNECTIONS` | `5`                  |
//! | `BAZAAR_STORE_NAME`         | unset (keep stored)  |

use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use bazaar_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: IpAddr,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Overrides the stored store name at startup when set
    pub store_name: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ApiConfig {
            host: lookup("BAZAAR_HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BAZAAR_HOST".to_string()))?,

            port: lookup("BAZAAR_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BAZAAR_PORT".to_string()))?,

            database_path: lookup("BAZAAR_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/bazaar.db")),

            db_max_connections: lookup("BAZAAR_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BAZAAR_DB_MAX_CONNECTIONS".to_string()))?,

            store_name: lookup("BAZAAR_STORE_NAME")
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "BAZAAR_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.database_path, PathBuf::from("./data/bazaar.db"));
        assert_eq!(config.db_max_connections, 5);
        assert!(config.store_name.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BAZAAR_HOST", "127.0.0.1"),
            ("BAZAAR_PORT", "3000"),
            ("BAZAAR_DB_PATH", "/tmp/shop.db"),
            ("BAZAAR_STORE_NAME", "  Corner Shop "),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.db_config().database_path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.store_name.as_deref(), Some("Corner Shop"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("BAZAAR_PORT", "eighty")]),
            Err(ConfigError::InvalidValue(key)) if key == "BAZAAR_PORT"
        ));
        assert!(load(&[("BAZAAR_DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(load(&[("BAZAAR_HOST", "not a host")]).is_err());
    }
}
