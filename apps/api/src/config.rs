//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable             | Default           |
//! |----------------------|-------------------|
//! | `HTTP_HOST`          | `0.0.0.0`         |
//! | `HTTP_PORT`          | `8000`            |
//! | `DATABASE_PATH`      | `./stockroom.db`  |
//! | `DB_MAX_CONNECTIONS` | `5`               |
//! | `LOG_FORMAT`         | `pretty`          |

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub host: IpAddr,

    /// HTTP port.
    pub port: u16,

    /// SQLite database file.
    pub database_path: PathBuf,

    /// Pool size, at least 1.
    pub max_connections: u32,

    pub log_format: LogFormat,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let config = ApiConfig {
            host: var("HTTP_HOST", "0.0.0.0")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_HOST".to_string()))?,

            port: var("HTTP_PORT", "8000")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: PathBuf::from(var("DATABASE_PATH", "./stockroom.db")),

            max_connections: var("DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            log_format: var("LOG_FORMAT", "pretty")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LOG_FORMAT".to_string()))?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Socket address to listen on.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
