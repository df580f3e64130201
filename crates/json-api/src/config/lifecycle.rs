//! Shutdown Config

use std::time::Duration;

use clap::Args;

/// Shutdown timing.
#[derive(Debug, Args)]
pub struct LifecycleConfig {
    /// Seconds to wait for background tasks after the server stops
    #[arg(long, env = "DRAIN_TIMEOUT_SECS", default_value_t = 30)]
    pub drain_timeout_secs: u64,

    /// Seconds in-flight requests get to finish once shutdown starts
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value_t = 30)]
    pub shutdown_grace_secs: u64,
}

impl LifecycleConfig {
    #[must_use]
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
