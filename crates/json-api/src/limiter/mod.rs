//! Per-client token bucket rate limiter.

mod middleware;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::{task::JoinHandle, time::Instant};
use tracing::debug;

use crate::config::limiter::LimiterConfig;

pub(crate) use middleware::RateLimit;

#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f64,
    last_seen: Instant,
}

impl TokenBucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_seen: now,
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_seen).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_seen = self.last_seen.max(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
pub(crate) struct RateLimiter {
    enabled: bool,
    rps: f64,
    burst: f64,
    idle_after: Duration,
    buckets: DashMap<String, TokenBucket>,
}

impl RateLimiter {
    pub(crate) fn new(config: &LimiterConfig) -> Self {
        Self {
            enabled: config.enabled,
            rps: config.rps.max(0.0),
            burst: f64::from(config.burst),
            idle_after: config.idle_after(),
            buckets: DashMap::new(),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Take one request from `key`'s budget.
    pub(crate) fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    pub(crate) fn allow_at(&self, key: &str, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }

        // The entry guard holds the shard lock across refill and decrement.
        self.buckets
            .entry(key.to_owned())
            .or_insert_with(|| TokenBucket::full(self.burst, now))
            .try_acquire(self.burst, self.rps, now)
    }

    /// Drop buckets idle for longer than the configured idle period.
    /// Returns how many were removed.
    pub(crate) fn sweep_at(&self, now: Instant) -> usize {
        let before = self.buckets.len();

        self.buckets
            .retain(|_key, bucket| now.saturating_duration_since(bucket.last_seen) < self.idle_after);

        before.saturating_sub(self.buckets.len())
    }

    pub(crate) fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    #[cfg(test)]
    fn available(&self, key: &str) -> Option<f64> {
        self.buckets.get(key).map(|bucket| bucket.tokens)
    }

    /// Run [`RateLimiter::sweep_at`] every `interval` until the returned
    /// handle is aborted. Disabled limiters keep no state and get no sweeper.
    pub(crate) fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> Option<JoinHandle<()>> {
        if !self.enabled {
            return None;
        }

        let limiter = Arc::clone(self);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            ticker.tick().await;

            loop {
                ticker.tick().await;

                let evicted = limiter.sweep_at(Instant::now());

                if evicted > 0 {
                    debug!(
                        evicted,
                        remaining = limiter.tracked_clients(),
                        "evicted idle rate limiter buckets"
                    );
                }
            }
        }))
    }
}
