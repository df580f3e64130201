//! JSON error envelope.
//!
//! Every failure leaves the server as `{"error": <message>}`, where the
//! message is a string or, for validation failures, a field-to-message object.

use salvo::{
    Depot, FlowCtrl, Request, Response, handler,
    http::{
        StatusCode,
        header::{HeaderValue, WWW_AUTHENTICATE},
    },
    writing::{Json, Scribe},
};
use serde::Serialize;
use thiserror::Error;
use turnstile_app::validator::ValidationErrors;

#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("validation failed")]
    Validation(ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("the requested resource could not be found")]
    NotFound,

    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(String),

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("invalid authentication credentials")]
    InvalidCredentials,

    #[error("invalid or missing authentication token")]
    InvalidToken,

    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,

    #[error("your user account must be activated to access this resource")]
    InactiveAccount,

    #[error("your user account doesn't have the necessary permissions")]
    NotPermitted,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("the server is temporarily unable to handle the request, please try again later")]
    Unavailable,

    #[error("the server encountered a problem and could not process your request")]
    Internal,
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::EditConflict => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::InvalidToken | Self::AuthenticationRequired => {
                StatusCode::UNAUTHORIZED
            }
            Self::InactiveAccount | Self::NotPermitted => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    error: Message<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Message<'a> {
    Text(String),
    Fields(&'a ValidationErrors),
}

impl Scribe for ApiError {
    fn render(self, res: &mut Response) {
        res.status_code(self.status());

        if matches!(self, Self::InvalidToken) {
            res.headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        let error = match &self {
            Self::Validation(errors) => Message::Fields(errors),
            other => Message::Text(other.to_string()),
        };

        res.render(Json(Envelope { error }));
    }
}

/// Catcher hoop giving unmatched routes and bare error statuses the envelope.
#[handler]
pub(crate) async fn envelope_errors(
    req: &mut Request,
    _depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let status = res.status_code.unwrap_or(StatusCode::NOT_FOUND);

    let error = match status {
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::METHOD_NOT_ALLOWED => ApiError::MethodNotAllowed(req.method().to_string()),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        StatusCode::SERVICE_UNAVAILABLE => ApiError::Unavailable,
        status if status.is_server_error() => ApiError::Internal,
        status => ApiError::BadRequest(
            status
                .canonical_reason()
                .unwrap_or("bad request")
                .to_lowercase(),
        ),
    };

    res.render(error);
    res.status_code(status);

    ctrl.skip_rest();
}

#[cfg(test)]
mod tests {
    use salvo::{
        catcher::Catcher,
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;

    use super::*;

    #[handler]
    async fn invalid() -> Result<&'static str, ApiError> {
        Err(ApiError::Validation(ValidationErrors::single(
            "email",
            "must be provided",
        )))
    }

    #[handler]
    async fn unauthenticated() -> Result<&'static str, ApiError> {
        Err(ApiError::InvalidToken)
    }

    fn service() -> Service {
        Service::new(
            Router::new()
                .push(Router::with_path("invalid").get(invalid))
                .push(Router::with_path("token").get(unauthenticated)),
        )
        .catcher(Catcher::default().hoop(envelope_errors))
    }

    #[tokio::test]
    async fn validation_errors_render_as_an_object() -> TestResult {
        let mut res = TestClient::get("http://example.com/invalid")
            .send(&service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({"error": {"email": "must be provided"}}));

        Ok(())
    }

    #[tokio::test]
    async fn invalid_token_sets_www_authenticate() -> TestResult {
        let mut res = TestClient::get("http://example.com/token")
            .send(&service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert_eq!(
            res.headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({"error": "invalid or missing authentication token"})
        );

        Ok(())
    }

    #[tokio::test]
    async fn unmatched_routes_use_the_envelope() -> TestResult {
        let mut res = TestClient::get("http://example.com/nowhere")
            .send(&service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({"error": "the requested resource could not be found"})
        );

        Ok(())
    }
}
