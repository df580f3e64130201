//! Logging, metrics and request tracing middleware.

use thiserror::Error;

mod logging;
mod metrics;
mod request;

pub(crate) use logging::init_subscriber;
pub(crate) use metrics::{Metrics, metrics_handler};
pub(crate) use request::RequestLogging;

/// Errors raised while initialising observability.
#[derive(Debug, Error)]
pub(crate) enum ObservabilityError {
    /// Failed to initialise tracing subscriber.
    #[error("failed to initialise tracing subscriber: {0}")]
    TracingSubscriber(#[from] tracing_subscriber::util::TryInitError),

    /// Failed to create or register a metric.
    #[error("failed to set up metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}
