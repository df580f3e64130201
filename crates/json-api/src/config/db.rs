//! Database Config

use std::time::Duration;

use clap::Args;
use turnstile_app::database::PoolSettings;

/// Database settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string (required for the postgres backend)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum open connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 25)]
    pub max_connections: u32,

    /// Seconds a connection may sit idle before it is closed
    #[arg(long, env = "DATABASE_IDLE_TIMEOUT_SECS", default_value_t = 900)]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    #[must_use]
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}
