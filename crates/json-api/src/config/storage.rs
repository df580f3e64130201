//! Storage Config

use std::time::Duration;

use clap::Args;

/// Where users, tokens, permissions and products live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageBackend {
    /// `PostgreSQL` via `DATABASE_URL`.
    Postgres,

    /// Process memory; lost on exit.
    Memory,
}

/// Storage settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Storage backend (postgres, memory)
    #[arg(long = "storage-backend", env = "STORAGE_BACKEND", value_enum, default_value_t = StorageBackend::Postgres)]
    pub backend: StorageBackend,

    /// Deadline in milliseconds for storage lookups made while authenticating
    #[arg(long = "storage-deadline-ms", env = "STORAGE_DEADLINE_MS", default_value_t = 3_000)]
    pub deadline_ms: u64,
}

impl StorageConfig {
    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}
