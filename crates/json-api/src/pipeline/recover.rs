//! Panic containment.

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt as _;
use salvo::{
    Depot, FlowCtrl, Request, Response, handler,
    http::header::{CONNECTION, HeaderValue},
};
use tracing::error;
use turnstile_app::lifecycle::panic_message;

use crate::{errors::ApiError, observability::Metrics};

/// Turns a panic anywhere further down the chain into a 500 and asks the
/// client to close the connection.
#[derive(Debug, Clone)]
pub(crate) struct RecoverPanic {
    metrics: Arc<Metrics>,
}

impl RecoverPanic {
    pub(crate) fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

#[handler]
impl RecoverPanic {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let method = req.method().to_string();
        let path = req.uri().path().to_owned();

        let outcome = AssertUnwindSafe(ctrl.call_next(req, depot, res))
            .catch_unwind()
            .await;

        if let Err(panic) = outcome {
            error!(
                method = %method,
                path = %path,
                panic = panic_message(&*panic),
                "recovered from panic while handling request"
            );

            self.metrics.record_panic_recovered();

            res.headers_mut()
                .insert(CONNECTION, HeaderValue::from_static("close"));
            res.render(ApiError::Internal);

            ctrl.skip_rest();
        }
    }
}
