//! Request-level logging and request IDs.

use std::{sync::Arc, time::Instant};

use salvo::{
    Request, handler,
    http::{Method, StatusCode, header::HeaderValue},
    prelude::{Depot, FlowCtrl, Response},
};
use tracing::{Instrument as _, error, info, warn};
use uuid::Uuid;

use super::Metrics;

const REQUEST_ID_HEADER: &str = "x-request-id";
const REQUEST_ID_DEPOT_KEY: &str = "request_id";

/// Route patterns reported as metric labels. Any other path is `unmatched`.
const ROUTES: [&str; 8] = [
    "/v1/healthcheck",
    "/v1/users",
    "/v1/users/activated",
    "/v1/users/password",
    "/v1/tokens/authentication",
    "/v1/tokens/password-reset",
    "/v1/products",
    "/v1/products/{id}",
];

const UNMATCHED_ROUTE: &str = "unmatched";

/// Assigns a request id, opens the `http.request` span and records the
/// outcome of every request.
#[derive(Debug, Clone)]
pub(crate) struct RequestLogging {
    metrics: Arc<Metrics>,
    slow_request_threshold_ms: u64,
}

impl RequestLogging {
    pub(crate) fn new(metrics: Arc<Metrics>, slow_request_threshold_ms: u64) -> Self {
        Self {
            metrics,
            slow_request_threshold_ms,
        }
    }
}

#[handler]
impl RequestLogging {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        if req.uri().path() == "/metrics" {
            ctrl.call_next(req, depot, res).await;
            return;
        }

        let started = Instant::now();

        let request_id = resolve_request_id(req.header::<String>(REQUEST_ID_HEADER));

        depot.insert(REQUEST_ID_DEPOT_KEY, request_id.clone());

        set_request_id_header(res, &request_id);

        let method = req.method().to_string();
        let path = req.uri().path().to_owned();
        let route = route_label(&path);
        let remote_addr = req.remote_addr().to_string();
        let _in_flight_request = self.metrics.track_in_flight();

        let span = tracing::info_span!(
            parent: None,
            "http.request",
            request_id = %request_id,
            method = %method,
            path = %path,
            remote_addr = %remote_addr,
            status = tracing::field::Empty,
            duration_ms = tracing::field::Empty
        );

        ctrl.call_next(req, depot, res)
            .instrument(span.clone())
            .await;

        let duration = started.elapsed();
        let status = res.status_code.unwrap_or(StatusCode::OK);
        let duration_ms = duration.as_millis();
        let threshold_ms = u128::from(self.slow_request_threshold_ms);

        self.metrics
            .observe_request(
                method_label(req.method()),
                route,
                status.as_u16(),
                duration.as_secs_f64(),
            );

        span.record("status", status.as_u16());
        span.record("duration_ms", duration_ms);

        span.in_scope(|| {
            info!(status = status.as_u16(), duration_ms, "request.completed");

            if status.is_server_error() {
                error!(
                    status = status.as_u16(),
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    "server error response"
                );
            } else if status.is_client_error() {
                warn!(
                    status = status.as_u16(),
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    "client error response"
                );
            }

            if duration_ms > threshold_ms {
                warn!(
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    duration_ms,
                    threshold_ms,
                    "slow request detected"
                );
            }
        });
    }
}

fn resolve_request_id(header_value: Option<String>) -> String {
    header_value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

fn set_request_id_header(res: &mut Response, request_id: &str) {
    let header_value = match HeaderValue::from_str(request_id) {
        Ok(value) => value,
        Err(source) => {
            warn!(
                request_id,
                "could not encode request id for response header: {source}"
            );

            return;
        }
    };

    res.headers_mut().insert(REQUEST_ID_HEADER, header_value);
}

fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::HEAD => "HEAD",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::PATCH => "PATCH",
        Method::DELETE => "DELETE",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

/// The known route `path` belongs to, with numeric segments as `{id}`.
fn route_label(path: &str) -> &'static str {
    let normalised = normalise_route(path);

    ROUTES
        .iter()
        .find(|route| **route == normalised)
        .copied()
        .unwrap_or(UNMATCHED_ROUTE)
}

fn normalise_route(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .fold(String::new(), |mut route, segment| {
            route.push('/');
            route.push_str(segment);
            route
        })
}
