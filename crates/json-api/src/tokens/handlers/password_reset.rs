//! Create Password Reset Token Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use tracing::{error, info};
use turnstile_app::{
    auth::TokenScope,
    mail::{Notification, deliver},
    users::{UsersError, validate_email},
    validator::{ValidationErrors, Validator},
};

use crate::{
    errors::ApiError, extensions::*, responses::MessageResponse, state::State,
    users::into_api_error,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CreatePasswordResetTokenRequest {
    pub email: String,
}

/// Create Password Reset Token Handler
///
/// Mails a password-reset token to an activated account.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let input: CreatePasswordResetTokenRequest = req.json_body().await?;

    let mut v = Validator::new();

    validate_email(&mut v, &input.email);

    v.finish()?;

    let user = match state.app.users.get_user_by_email(&input.email).await {
        Ok(user) => user,
        Err(UsersError::NotFound) => {
            return Err(
                ValidationErrors::single("email", "no matching email address found").into(),
            );
        }
        Err(error) => return Err(into_api_error(error)),
    };

    if !user.activated {
        return Err(ValidationErrors::single("email", "user account must be activated").into());
    }

    let token = state
        .app
        .tokens
        .create(
            user.id,
            TokenScope::PasswordReset.default_ttl(),
            TokenScope::PasswordReset,
        )
        .await
        .or_500("failed to create password reset token")?;

    let mailer = Arc::clone(&state.app.mailer);
    let recipient = user.email.clone();
    let notification = Notification::PasswordReset {
        reset_token: token.plaintext,
    };
    let user_id = user.id;

    state.app.tasks.dispatch("password-reset-email", async move {
        if let Err(error) = deliver(mailer.as_ref(), &recipient, &notification).await {
            error!(user_id = %user_id, "failed to send password reset email: {error}");
        }
    });

    info!(user_id = %user.id, "password reset token issued");

    res.status_code(StatusCode::ACCEPTED);

    Ok(Json(MessageResponse::new(
        "an email will be sent to you containing password reset instructions",
    )))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;
    use turnstile_app::{
        clock::SystemClock, context::AppContext, lifecycle::DrainOutcome, mail::MockMailer,
    };

    use crate::test_helpers::{activated_user, inactive_user, memory_state, state_with_app};

    use super::*;

    fn make_service(state: Arc<State>) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(state))
                .push(Router::with_path("v1/tokens/password-reset").post(handler)),
        )
    }

    #[tokio::test]
    async fn test_activated_user_gets_a_reset_mail() -> TestResult {
        let mut mailer = MockMailer::new();

        mailer
            .expect_send()
            .once()
            .withf(|recipient, notification| {
                recipient == "alice@example.com"
                    && matches!(notification, Notification::PasswordReset { .. })
            })
            .returning(|_, _| Ok(()));

        let state = state_with_app(
            AppContext::memory(Arc::new(SystemClock)).with_mailer(Arc::new(mailer)),
        );

        activated_user(&state, "alice@example.com").await?;

        let mut res = TestClient::post("http://example.com/v1/tokens/password-reset")
            .json(&json!({"email": "alice@example.com"}))
            .send(&make_service(Arc::clone(&state)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::ACCEPTED));

        let body: MessageResponse = res.take_json().await?;

        assert_eq!(
            body.message,
            "an email will be sent to you containing password reset instructions"
        );
        assert_eq!(
            state.app.tasks.drain(Duration::from_secs(5)).await,
            DrainOutcome::Drained
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_email_returns_422() -> TestResult {
        let mut res = TestClient::post("http://example.com/v1/tokens/password-reset")
            .json(&json!({"email": "nobody@example.com"}))
            .send(&make_service(memory_state()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({"error": {"email": "no matching email address found"}})
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_user_returns_422() -> TestResult {
        let state = memory_state();

        inactive_user(&state, "bob@example.com").await?;

        let mut res = TestClient::post("http://example.com/v1/tokens/password-reset")
            .json(&json!({"email": "bob@example.com"}))
            .send(&make_service(state))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({"error": {"email": "user account must be activated"}})
        );

        Ok(())
    }
}
