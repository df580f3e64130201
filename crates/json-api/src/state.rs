//! State

use std::{sync::Arc, time::Duration};

use turnstile_app::context::AppContext;

use crate::observability::Metrics;

/// Shared by every handler through the depot.
#[derive(Debug, Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,
    pub(crate) environment: String,

    /// Upper bound on storage lookups made on the request path.
    pub(crate) storage_deadline: Duration,
    pub(crate) metrics: Arc<Metrics>,
}

impl State {
    #[must_use]
    pub(crate) fn new(
        app: AppContext,
        environment: String,
        storage_deadline: Duration,
        metrics: Arc<Metrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            app,
            environment,
            storage_deadline,
            metrics,
        })
    }
}
