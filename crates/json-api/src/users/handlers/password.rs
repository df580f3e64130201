//! Reset Password Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use tracing::{error, info};
use turnstile_app::{
    auth::{AuthServiceError, TokenScope, validate_token_plaintext},
    users::validate_password_plaintext,
    validator::{ValidationErrors, Validator},
};

use crate::{
    errors::ApiError,
    extensions::*,
    responses::MessageResponse,
    state::State,
    users::{hash_password, into_api_error},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ResetPasswordRequest {
    pub password: String,
    pub token: String,
}

/// Reset Password Handler
///
/// Sets a new password using a password-reset token, then revokes every
/// reset token the user holds.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let input: ResetPasswordRequest = req.json_body().await?;

    let mut v = Validator::new();

    validate_password_plaintext(&mut v, &input.password);
    validate_token_plaintext(&mut v, &input.token);

    v.finish()?;

    let mut user = state
        .app
        .tokens
        .resolve(TokenScope::PasswordReset, &input.token)
        .await
        .map_err(|error| match error {
            AuthServiceError::NotFound => {
                ApiError::from(ValidationErrors::single(
                    "token",
                    "invalid or expired password reset token",
                ))
            }
            other => {
                error!("failed to resolve password reset token: {other}");

                ApiError::Internal
            }
        })?;

    user.password = hash_password(input.password).await?;

    let user = state
        .app
        .users
        .update_user(&user)
        .await
        .map_err(into_api_error)?;

    state
        .app
        .tokens
        .revoke_all(TokenScope::PasswordReset, user.id)
        .await
        .or_500("failed to revoke password reset tokens")?;

    info!(user_id = %user.id, "password reset");

    Ok(Json(MessageResponse::new(
        "your password was successfully reset",
    )))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;

    use crate::test_helpers::{activated_user, memory_state};

    use super::*;

    fn make_service(state: Arc<State>) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(state))
                .push(Router::with_path("v1/users/password").put(handler)),
        )
    }

    #[tokio::test]
    async fn test_reset_changes_the_password() -> TestResult {
        let state = memory_state();
        let user = activated_user(&state, "alice@example.com").await?;
        let token = state
            .app
            .tokens
            .create(
                user.id,
                TokenScope::PasswordReset.default_ttl(),
                TokenScope::PasswordReset,
            )
            .await?;
        let body = json!({"password": "n3w-pa55word", "token": token.plaintext.as_str()});

        let mut res = TestClient::put("http://example.com/v1/users/password")
            .json(&body)
            .send(&make_service(Arc::clone(&state)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let message: MessageResponse = res.take_json().await?;

        assert_eq!(message.message, "your password was successfully reset");

        let stored = state.app.users.get_user_by_email("alice@example.com").await?;

        assert!(stored.password.matches("n3w-pa55word")?, "new password set");

        let res = TestClient::put("http://example.com/v1/users/password")
            .json(&body)
            .send(&make_service(state))
            .await;

        assert_eq!(
            res.status_code,
            Some(StatusCode::UNPROCESSABLE_ENTITY),
            "reset tokens are single use"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_reset_validates_both_fields() -> TestResult {
        let mut res = TestClient::put("http://example.com/v1/users/password")
            .json(&json!({"password": "short", "token": ""}))
            .send(&make_service(memory_state()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({"error": {
                "password": "must be at least 8 bytes long",
                "token": "must be provided",
            }})
        );

        Ok(())
    }
}
