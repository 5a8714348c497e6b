//! Account service configuration.

use std::env;

use common::{DatabaseConfig, ServerConfig, MEMORY_DATABASE_URL};

/// Account service configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database: DatabaseConfig {
                url: env::var("ACCOUNT_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(defaults.database.max_connections),
                min_connections: defaults.database.min_connections,
            },
            server: ServerConfig {
                host: env::var("ACCOUNT_SERVICE_HOST").unwrap_or(defaults.server.host),
                port: env::var("ACCOUNT_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
        }
    }

    /// Switch to the in-process store.
    pub fn in_memory(mut self) -> Self {
        self.database.url = MEMORY_DATABASE_URL.to_string();
        self
    }
}
