//! Server configuration module

use clap::Parser;

use crate::config::{
    cors::CorsConfig,
    db::DatabaseConfig,
    lifecycle::LifecycleConfig,
    limiter::LimiterConfig,
    observability::LoggingConfig,
    server::ServerRuntimeConfig,
    storage::StorageConfig,
};

pub(crate) mod cors;
pub(crate) mod db;
pub(crate) mod lifecycle;
pub(crate) mod limiter;
pub(crate) mod observability;
pub(crate) mod server;
pub(crate) mod storage;

/// Turnstile JSON API Server configuration
#[derive(Debug, Parser)]
#[command(
    name = "turnstile-json",
    version,
    about = "Turnstile JSON API Server",
    long_about = None
)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Per-client rate limiting.
    #[command(flatten)]
    pub limiter: LimiterConfig,

    /// Cross-origin settings.
    #[command(flatten)]
    pub cors: CorsConfig,

    /// Shutdown timing.
    #[command(flatten)]
    pub lifecycle: LifecycleConfig,

    /// Storage backend selection and deadlines.
    #[command(flatten)]
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;

    use super::*;
    use crate::config::storage::StorageBackend;

    #[test]
    fn defaults_match_the_documented_values() -> TestResult {
        let config = ServerConfig::try_parse_from(["turnstile-json", "--storage-backend", "memory"])?;

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.environment, "development");
        assert!(config.limiter.enabled, "limiter on by default");
        assert!((config.limiter.rps - 2.0).abs() < f64::EPSILON, "2 rps");
        assert_eq!(config.limiter.burst, 4);
        assert!(!config.limiter.trust_forwarded_for, "opt-in only");
        assert!(config.cors.trusted_origins.is_empty(), "no trusted origins");
        assert_eq!(config.lifecycle.drain_timeout(), Duration::from_secs(30));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.deadline(), Duration::from_millis(3_000));

        Ok(())
    }

    #[test]
    fn trusted_origins_are_space_separated() -> TestResult {
        let config = ServerConfig::try_parse_from([
            "turnstile-json",
            "--storage-backend",
            "memory",
            "--cors-trusted-origins",
            "https://a.example https://b.example",
        ])?;

        assert_eq!(
            config.cors.trusted_origins,
            ["https://a.example", "https://b.example"]
        );

        Ok(())
    }

    #[test]
    fn version_flag_prints_the_package_version() {
        let result = ServerConfig::try_parse_from(["turnstile-json", "--version"]);

        let Err(error) = result else {
            std::panic::panic_any("--version should stop parsing");
        };

        assert_eq!(error.kind(), clap::error::ErrorKind::DisplayVersion);
        assert!(
            error.to_string().contains(env!("CARGO_PKG_VERSION")),
            "version text: {error}"
        );
    }
}
