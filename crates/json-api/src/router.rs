//! App Router

use std::sync::Arc;

use salvo::{affix_state::inject, catcher::Catcher, prelude::*, trailing_slash::remove_slash};

use crate::{
    errors::envelope_errors,
    healthcheck,
    limiter::{RateLimit, RateLimiter},
    observability::{RequestLogging, metrics_handler},
    pipeline::{
        Cors, RecoverPanic, RequirePermission, authenticate, require_activated,
        require_authenticated,
    },
    products,
    state::State,
    tokens, users,
};

/// Pipeline settings that come from configuration rather than state.
#[derive(Debug, Clone, Default)]
pub(crate) struct PipelineOptions {
    pub trusted_origins: Vec<String>,
    pub trust_forwarded_for: bool,
    pub slow_request_threshold_ms: u64,
}

pub(crate) fn app_router() -> Router {
    Router::new().hoop(remove_slash()).push(
        Router::with_path("v1")
            .push(Router::with_path("healthcheck").get(healthcheck::handler))
            .push(
                Router::with_path("users")
                    .post(users::handlers::register::handler)
                    .push(Router::with_path("activated").put(users::handlers::activate::handler))
                    .push(Router::with_path("password").put(users::handlers::password::handler)),
            )
            .push(
                Router::with_path("tokens")
                    .push(
                        Router::with_path("authentication")
                            .post(tokens::handlers::authentication::handler),
                    )
                    .push(
                        Router::with_path("password-reset")
                            .post(tokens::handlers::password_reset::handler),
                    ),
            )
            .push(
                Router::with_path("products")
                    .hoop(require_authenticated)
                    .hoop(require_activated)
                    .push(
                        Router::new()
                            .hoop(RequirePermission::new("products:write"))
                            .post(products::handlers::create::handler),
                    )
                    .push(
                        Router::with_path("{id}")
                            .hoop(RequirePermission::new("products:read"))
                            .get(products::handlers::get::handler),
                    ),
            ),
    )
    .push(Router::with_path("metrics").get(metrics_handler))
}

/// Wrap `router` in the request pipeline, outermost first: panic
/// containment, request logging, CORS, rate limiting, authentication.
pub(crate) fn service(
    router: Router,
    state: Arc<State>,
    limiter: Arc<RateLimiter>,
    options: &PipelineOptions,
) -> Service {
    let metrics = Arc::clone(&state.metrics);

    Service::new(router)
        .hoop(RecoverPanic::new(Arc::clone(&metrics)))
        .hoop(RequestLogging::new(
            Arc::clone(&metrics),
            options.slow_request_threshold_ms,
        ))
        .hoop(Cors::new(options.trusted_origins.clone()))
        .hoop(RateLimit::new(limiter, metrics, options.trust_forwarded_for))
        .hoop(inject(state))
        .hoop(authenticate)
        .catcher(Catcher::default().hoop(envelope_errors))
}
