//! Rate limiting hoop.

use std::sync::Arc;

use salvo::{Depot, FlowCtrl, Request, Response, handler};
use tracing::warn;

use crate::{errors::ApiError, limiter::RateLimiter, observability::Metrics};

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Rejects requests from clients that have spent their budget with 429.
#[derive(Debug, Clone)]
pub(crate) struct RateLimit {
    limiter: Arc<RateLimiter>,
    metrics: Arc<Metrics>,
    trust_forwarded_for: bool,
}

impl RateLimit {
    pub(crate) fn new(
        limiter: Arc<RateLimiter>,
        metrics: Arc<Metrics>,
        trust_forwarded_for: bool,
    ) -> Self {
        Self {
            limiter,
            metrics,
            trust_forwarded_for,
        }
    }
}

#[handler]
impl RateLimit {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        if !self.limiter.is_enabled() {
            ctrl.call_next(req, depot, res).await;
            return;
        }

        let key = client_key(req, self.trust_forwarded_for);

        if self.limiter.allow(&key) {
            ctrl.call_next(req, depot, res).await;
            return;
        }

        warn!(client = %key, "rate limit exceeded");

        self.metrics.record_rate_limited();

        res.render(ApiError::RateLimited);

        ctrl.skip_rest();
    }
}

/// Identity the limiter budgets by: the peer IP, or the first
/// `X-Forwarded-For` entry when that header is trusted.
pub(crate) fn client_key(req: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for
        && let Some(forwarded) = req
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty())
    {
        return forwarded.to_owned();
    }

    let remote = req.remote_addr();

    remote
        .as_ipv4()
        .map(|addr| addr.ip().to_string())
        .or_else(|| remote.as_ipv6().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| remote.to_string())
}
