//! Prometheus metrics collection and exposition endpoint.

use std::sync::Arc;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use salvo::{
    Depot, Response, handler,
    http::header::{CONTENT_TYPE, HeaderValue},
};

use crate::{errors::ApiError, extensions::*, state::State};

/// Metrics registry and the collectors the server reports into.
#[derive(Debug, Clone)]
pub(crate) struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
    requests_in_flight: IntGauge,
    rate_limited_total: IntCounter,
    panics_recovered_total: IntCounter,
    background_tasks_pending: IntGauge,
}

#[derive(Debug)]
pub(crate) struct InFlightRequestGuard {
    gauge: IntGauge,
}

impl Drop for InFlightRequestGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

impl Metrics {
    pub(crate) fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(
                "turnstile_http_requests_total",
                "Total HTTP requests partitioned by method, route, status class, and status code.",
            ),
            &["method", "route", "status_class", "status_code"],
        )?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "turnstile_http_request_duration_seconds",
                "HTTP request duration in seconds partitioned by method and route.",
            )
            .buckets(vec![
                0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "route"],
        )?;

        let requests_in_flight = IntGauge::with_opts(Opts::new(
            "turnstile_http_requests_in_flight",
            "Current number of in-flight HTTP requests.",
        ))?;

        let rate_limited_total = IntCounter::with_opts(Opts::new(
            "turnstile_rate_limited_total",
            "Requests rejected by the per-client rate limiter.",
        ))?;

        let panics_recovered_total = IntCounter::with_opts(Opts::new(
            "turnstile_panics_recovered_total",
            "Handler panics converted into 500 responses.",
        ))?;

        let background_tasks_pending = IntGauge::with_opts(Opts::new(
            "turnstile_background_tasks_pending",
            "Background tasks dispatched but not yet finished.",
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;
        registry.register(Box::new(requests_in_flight.clone()))?;
        registry.register(Box::new(rate_limited_total.clone()))?;
        registry.register(Box::new(panics_recovered_total.clone()))?;
        registry.register(Box::new(background_tasks_pending.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration_seconds,
            requests_in_flight,
            rate_limited_total,
            panics_recovered_total,
            background_tasks_pending,
        })
    }

    pub(crate) fn track_in_flight(&self) -> InFlightRequestGuard {
        self.requests_in_flight.inc();

        InFlightRequestGuard {
            gauge: self.requests_in_flight.clone(),
        }
    }

    pub(crate) fn observe_request(
        &self,
        method: &str,
        route: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_class = status_class(status_code);
        let status_code = status_code.to_string();

        self.requests_total
            .with_label_values(&[method, route, status_class, status_code.as_str()])
            .inc();

        self.request_duration_seconds
            .with_label_values(&[method, route])
            .observe(duration_seconds);
    }

    pub(crate) fn record_rate_limited(&self) {
        self.rate_limited_total.inc();
    }

    pub(crate) fn record_panic_recovered(&self) {
        self.panics_recovered_total.inc();
    }

    #[cfg(test)]
    pub(crate) fn panics_recovered(&self) -> u64 {
        self.panics_recovered_total.get()
    }

    #[cfg(test)]
    pub(crate) fn rate_limited(&self) -> u64 {
        self.rate_limited_total.get()
    }

    /// Number of label combinations recorded on the request counter.
    #[cfg(test)]
    pub(crate) fn request_series(&self) -> Result<usize, prometheus::Error> {
        let (_content_type, body) = self.encode()?;

        Ok(body
            .lines()
            .filter(|line| line.starts_with("turnstile_http_requests_total{"))
            .count())
    }

    pub(crate) fn set_background_tasks_pending(&self, pending: usize) {
        self.background_tasks_pending
            .set(i64::try_from(pending).unwrap_or(i64::MAX));
    }

    /// Text exposition of every registered metric, with its content type.
    pub(crate) fn encode(&self) -> Result<(String, String), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut encoded = Vec::new();

        encoder.encode(&self.registry.gather(), &mut encoded)?;

        Ok((
            encoder.format_type().to_owned(),
            String::from_utf8_lossy(&encoded).into_owned(),
        ))
    }
}

#[handler]
pub(crate) async fn metrics_handler(depot: &mut Depot, res: &mut Response) -> Result<(), ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .metrics
        .set_background_tasks_pending(state.app.tasks.pending());

    let (content_type, body) = state.metrics.encode().or_500("failed to encode metrics")?;
    let content_type = HeaderValue::from_str(&content_type)
        .or_500("failed to encode metrics content type header")?;

    res.headers_mut().insert(CONTENT_TYPE, content_type);
    res.render(body);

    Ok(())
}

fn status_class(status_code: u16) -> &'static str {
    match status_code {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
