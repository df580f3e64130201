//! Rate Limiter Config

use std::time::Duration;

use clap::{ArgAction, Args};

/// Per-client token bucket settings.
#[derive(Debug, Clone, Args)]
pub struct LimiterConfig {
    /// Enable rate limiting
    #[arg(
        long = "limiter-enabled",
        env = "LIMITER_ENABLED",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub enabled: bool,

    /// Sustained requests per second per client
    #[arg(long = "limiter-rps", env = "LIMITER_RPS", default_value_t = 2.0)]
    pub rps: f64,

    /// Maximum burst per client
    #[arg(long = "limiter-burst", env = "LIMITER_BURST", default_value_t = 4)]
    pub burst: u32,

    /// Seconds between sweeps of idle client buckets
    #[arg(
        long = "limiter-sweep-interval-secs",
        env = "LIMITER_SWEEP_INTERVAL_SECS",
        default_value_t = 60
    )]
    pub sweep_interval_secs: u64,

    /// Buckets idle for this many sweep intervals are evicted
    #[arg(
        long = "limiter-idle-multiple",
        env = "LIMITER_IDLE_MULTIPLE",
        default_value_t = 3
    )]
    pub idle_multiple: u32,

    /// Key clients by the first `X-Forwarded-For` entry instead of the peer address
    #[arg(
        long = "limiter-trust-forwarded-for",
        env = "LIMITER_TRUST_FORWARDED_FOR",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub trust_forwarded_for: bool,
}

impl LimiterConfig {
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// Idle time after which a bucket is evicted.
    #[must_use]
    pub fn idle_after(&self) -> Duration {
        self.sweep_interval().saturating_mul(self.idle_multiple.max(1))
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rps: 2.0,
            burst: 4,
            sweep_interval_secs: 60,
            idle_multiple: 3,
            trust_forwarded_for: false,
        }
    }
}
