//! Activate User Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use tracing::{error, info};
use turnstile_app::{
    auth::{AuthServiceError, TokenScope, validate_token_plaintext},
    validator::{ValidationErrors, Validator},
};

use crate::{
    errors::ApiError,
    extensions::*,
    state::State,
    users::{UserEnvelope, into_api_error},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ActivateUserRequest {
    pub token: String,
}

/// Activate User Handler
///
/// Exchanges an activation token for an activated account. Every
/// activation token the user holds is revoked afterwards.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<UserEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let input: ActivateUserRequest = req.json_body().await?;

    let mut v = Validator::new();

    validate_token_plaintext(&mut v, &input.token);

    v.finish()?;

    let mut user = state
        .app
        .tokens
        .resolve(TokenScope::Activation, &input.token)
        .await
        .map_err(|error| match error {
            AuthServiceError::NotFound => {
                ApiError::from(ValidationErrors::single(
                    "token",
                    "invalid or expired activation token",
                ))
            }
            other => {
                error!("failed to resolve activation token: {other}");

                ApiError::Internal
            }
        })?;

    user.activated = true;

    let user = state
        .app
        .users
        .update_user(&user)
        .await
        .map_err(into_api_error)?;

    state
        .app
        .tokens
        .revoke_all(TokenScope::Activation, user.id)
        .await
        .or_500("failed to revoke activation tokens")?;

    info!(user_id = %user.id, "user activated");

    Ok(Json((&user).into()))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;

    use crate::test_helpers::{inactive_user, memory_state};

    use super::*;

    fn make_service(state: Arc<State>) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(state))
                .push(Router::with_path("v1/users/activated").put(handler)),
        )
    }

    #[tokio::test]
    async fn test_activation_flips_the_flag_and_burns_the_token() -> TestResult {
        let state = memory_state();
        let user = inactive_user(&state, "bob@example.com").await?;
        let token = state
            .app
            .tokens
            .create(
                user.id,
                TokenScope::Activation.default_ttl(),
                TokenScope::Activation,
            )
            .await?;
        let body = json!({"token": token.plaintext.as_str()});

        let mut res = TestClient::put("http://example.com/v1/users/activated")
            .json(&body)
            .send(&make_service(Arc::clone(&state)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let envelope: UserEnvelope = res.take_json().await?;

        assert!(envelope.user.activated, "user should now be active");

        let mut res = TestClient::put("http://example.com/v1/users/activated")
            .json(&body)
            .send(&make_service(state))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({"error": {"token": "invalid or expired activation token"}})
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_token_returns_422() -> TestResult {
        let mut res = TestClient::put("http://example.com/v1/users/activated")
            .json(&json!({"token": "short"}))
            .send(&make_service(memory_state()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({"error": {"token": "must be 43 bytes long"}}));

        Ok(())
    }

    #[tokio::test]
    async fn test_authentication_token_cannot_activate() -> TestResult {
        let state = memory_state();
        let user = inactive_user(&state, "bob@example.com").await?;
        let token = state
            .app
            .tokens
            .create(
                user.id,
                TokenScope::Authentication.default_ttl(),
                TokenScope::Authentication,
            )
            .await?;

        let res = TestClient::put("http://example.com/v1/users/activated")
            .json(&json!({"token": token.plaintext.as_str()}))
            .send(&make_service(state))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}
