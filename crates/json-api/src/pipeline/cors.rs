//! Cross-origin resource sharing.

use std::sync::Arc;

use salvo::{
    Depot, FlowCtrl, Request, Response, handler,
    http::{
        Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD, HeaderValue, ORIGIN, VARY,
        },
    },
};

const ALLOWED_METHODS: &str = "OPTIONS, PUT, PATCH, DELETE";
const ALLOWED_HEADERS: &str = "Authorization, Content-Type";

/// Reflects trusted origins and answers their preflight requests.
///
/// Install on the [`salvo::Service`]: router hoops only run once a route
/// matches, and most paths have no `OPTIONS` route.
#[derive(Debug, Clone)]
pub(crate) struct Cors {
    trusted_origins: Arc<[String]>,
}

impl Cors {
    pub(crate) fn new(trusted_origins: Vec<String>) -> Self {
        Self {
            trusted_origins: trusted_origins.into(),
        }
    }

    fn is_trusted(&self, origin: &str) -> bool {
        self.trusted_origins.iter().any(|trusted| trusted == origin)
    }
}

#[handler]
impl Cors {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let headers = res.headers_mut();

        headers.append(VARY, HeaderValue::from_static("Origin"));
        headers.append(VARY, HeaderValue::from_static("Access-Control-Request-Method"));

        let origin = req
            .headers()
            .get(ORIGIN)
            .filter(|origin| origin.to_str().is_ok_and(|origin| self.is_trusted(origin)))
            .cloned();

        if let Some(origin) = origin {
            res.headers_mut().insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);

            let preflight = req.method() == Method::OPTIONS
                && req.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD);

            if preflight {
                let headers = res.headers_mut();

                headers.insert(
                    ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(ALLOWED_METHODS),
                );
                headers.insert(
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOWED_HEADERS),
                );

                res.status_code(StatusCode::OK);

                ctrl.skip_rest();

                return;
            }
        }

        ctrl.call_next(req, depot, res).await;
    }
}
