//! Server configuration.

use std::env;
use std::net::SocketAddr;

use anyhow::Context;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// SQLite connection URL.
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 8000)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://tasks.db".to_string()),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
        })
    }

    pub fn server_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        Err(_) => {
            tracing::debug!("{} not set, using default", key);
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases touch the same variables, so they share one test.
    #[test]
    fn test_defaults_and_invalid_port() {
        env::remove_var("HOST");
        env::remove_var("PORT");
        env::remove_var("DATABASE_URL");
        env::remove_var("DATABASE_MAX_CONNECTIONS");

        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.database_url, "sqlite://tasks.db");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.server_addr().unwrap().to_string(), "0.0.0.0:8000");

        env::set_var("PORT", "not-a-port");
        assert!(Config::from_env().is_err());
        env::remove_var("PORT");
    }
}
