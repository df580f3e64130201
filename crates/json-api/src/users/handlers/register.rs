//! Register User Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use tracing::{error, info};
use turnstile_app::{
    auth::TokenScope,
    mail::{Notification, deliver},
    users::{NewUser, validate_user},
    validator::Validator,
};

use crate::{
    errors::ApiError,
    extensions::*,
    state::State,
    users::{DEFAULT_PERMISSIONS, UserEnvelope, hash_password, into_api_error},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Register User Handler
///
/// Creates an inactive user with the default permissions and mails them an
/// activation token in the background.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<UserEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let input: RegisterUserRequest = req.json_body().await?;

    let mut v = Validator::new();

    validate_user(&mut v, &input.name, &input.email, &input.password);

    v.finish()?;

    let password = hash_password(input.password).await?;

    let user = state
        .app
        .users
        .insert_user(NewUser {
            name: input.name,
            email: input.email,
            password,
            activated: false,
        })
        .await
        .map_err(into_api_error)?;

    let codes = DEFAULT_PERMISSIONS.map(str::to_string);

    state
        .app
        .permissions
        .grant(user.id, &codes)
        .await
        .or_500("failed to grant default permissions")?;

    let token = state
        .app
        .tokens
        .create(
            user.id,
            TokenScope::Activation.default_ttl(),
            TokenScope::Activation,
        )
        .await
        .or_500("failed to create activation token")?;

    let mailer = Arc::clone(&state.app.mailer);
    let recipient = user.email.clone();
    let notification = Notification::Welcome {
        user_id: user.id,
        name: user.name.clone(),
        activation_token: token.plaintext,
    };
    let user_id = user.id;

    state.app.tasks.dispatch("welcome-email", async move {
        if let Err(error) = deliver(mailer.as_ref(), &recipient, &notification).await {
            error!(user_id = %user_id, "failed to send welcome email: {error}");
        }
    });

    info!(user_id = %user.id, "user registered");

    res.status_code(StatusCode::ACCEPTED);

    Ok(Json((&user).into()))
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
        clock::SystemClock,
        context::AppContext,
        lifecycle::DrainOutcome,
        mail::MockMailer,
        users::UserId,
    };

    use crate::test_helpers::{activated_user, memory_state, state_with_app};

    use super::*;

    fn make_service(state: Arc<State>) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(state))
                .push(Router::with_path("v1/users").post(handler)),
        )
    }

    fn alice() -> Value {
        json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "pa$$word123",
        })
    }

    #[tokio::test]
    async fn test_register_returns_202_and_sends_welcome() -> TestResult {
        let mut mailer = MockMailer::new();

        mailer
            .expect_send()
            .once()
            .withf(|recipient, notification| {
                recipient == "alice@example.com"
                    && matches!(
                        notification,
                        Notification::Welcome { user_id, name, .. }
                            if *user_id == UserId::new(1) && name == "Alice"
                    )
            })
            .returning(|_, _| Ok(()));

        let state = state_with_app(
            AppContext::memory(Arc::new(SystemClock)).with_mailer(Arc::new(mailer)),
        );

        let mut res = TestClient::post("http://example.com/v1/users")
            .json(&alice())
            .send(&make_service(Arc::clone(&state)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::ACCEPTED));

        let body: UserEnvelope = res.take_json().await?;

        assert_eq!(body.user.id, 1);
        assert_eq!(body.user.email, "alice@example.com");
        assert!(!body.user.activated, "new users start inactive");

        let permissions = state.app.permissions.load_for_user(UserId::new(1)).await?;

        assert!(permissions.includes("products:read"), "default grant");
        assert!(!permissions.includes("products:write"), "no write grant");

        assert_eq!(
            state.app.tasks.drain(Duration::from_secs(5)).await,
            DrainOutcome::Drained
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_register_never_echoes_the_password() -> TestResult {
        let mut res = TestClient::post("http://example.com/v1/users")
            .json(&alice())
            .send(&make_service(memory_state()))
            .await;

        let body = res.take_string().await?;

        assert!(!body.contains("password"), "{body}");
        assert!(!body.contains("argon2"), "{body}");

        Ok(())
    }

    #[tokio::test]
    async fn test_register_invalid_email_returns_422() -> TestResult {
        let mut res = TestClient::post("http://example.com/v1/users")
            .json(&json!({
                "name": "Alice",
                "email": "invalid-email",
                "password": "pa$$word123",
            }))
            .send(&make_service(memory_state()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({"error": {"email": "must be a valid email address"}})
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_register_missing_password_returns_422() -> TestResult {
        let mut res = TestClient::post("http://example.com/v1/users")
            .json(&json!({"name": "Alice", "email": "alice@example.com"}))
            .send(&make_service(memory_state()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({"error": {"password": "must be provided"}}));

        Ok(())
    }

    #[tokio::test]
    async fn test_register_duplicate_email_returns_422() -> TestResult {
        let state = memory_state();

        activated_user(&state, "alice@example.com").await?;

        let mut res = TestClient::post("http://example.com/v1/users")
            .json(&alice())
            .send(&make_service(state))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        let body: Value = res.take_json().await?;

        assert_eq!(
            body,
            json!({"error": {"email": "a user with this email address already exists"}})
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_register_unknown_field_returns_400() -> TestResult {
        let mut res = TestClient::post("http://example.com/v1/users")
            .json(&json!({
                "name": "Alice",
                "email": "alice@example.com",
                "password": "pa$$word123",
                "admin": true,
            }))
            .send(&make_service(memory_state()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: Value = res.take_json().await?;

        assert_eq!(body, json!({"error": "body contains badly-formed JSON"}));

        Ok(())
    }
}
