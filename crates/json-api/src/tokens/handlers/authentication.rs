//! Create Authentication Token Handler

use std::sync::Arc;

use jiff::Timestamp;
use salvo::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use turnstile_app::{
    auth::TokenScope,
    users::{UsersError, validate_email, validate_password_plaintext},
    validator::Validator,
};

use crate::{
    errors::ApiError,
    extensions::*,
    state::State,
    users::{into_api_error, verify_password},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CreateAuthenticationTokenRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AuthenticationToken {
    pub token: String,
    pub expiry: Timestamp,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AuthenticationTokenResponse {
    pub authentication_token: AuthenticationToken,
}

/// Create Authentication Token Handler
///
/// Trades an email and password for a bearer token. Unknown emails and
/// wrong passwords get the same 401.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<AuthenticationTokenResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let input: CreateAuthenticationTokenRequest = req.json_body().await?;

    let mut v = Validator::new();

    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);

    v.finish()?;

    let user = match state.app.users.get_user_by_email(&input.email).await {
        Ok(user) => user,
        Err(UsersError::NotFound) => return Err(ApiError::InvalidCredentials),
        Err(error) => return Err(into_api_error(error)),
    };

    if !verify_password(user.password.clone(), input.password).await? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .app
        .tokens
        .create(
            user.id,
            TokenScope::Authentication.default_ttl(),
            TokenScope::Authentication,
        )
        .await
        .or_500("failed to create authentication token")?;

    info!(user_id = %user.id, "authentication token issued");

    res.status_code(StatusCode::CREATED);

    Ok(Json(AuthenticationTokenResponse {
        authentication_token: AuthenticationToken {
            token: token.plaintext.as_str().to_owned(),
            expiry: token.expiry,
        },
    }))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use serde_json::{Value, json};
    use testresult::TestResult;

    use crate::test_helpers::{memory_state, user_with_password};

    use super::*;

    fn make_service(state: Arc<State>) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(state))
                .push(Router::with_path("v1/tokens/authentication").post(handler)),
        )
    }

    #[tokio::test]
    async fn test_valid_credentials_return_a_usable_token() -> TestResult {
        let state = memory_state();
        let user = user_with_password(&state, "alice@example.com", "pa55word", true).await?;

        let mut res = TestClient::post("http://example.com/v1/tokens/authentication")
            .json(&json!({"email": "alice@example.com", "password": "pa55word"}))
            .send(&make_service(Arc::clone(&state)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        let body: AuthenticationTokenResponse = res.take_json().await?;

        assert_eq!(body.authentication_token.token.len(), 43);
        assert!(
            body.authentication_token.expiry > Timestamp::now(),
            "expiry lies in the future"
        );

        let resolved = state
            .app
            .tokens
            .resolve(TokenScope::Authentication, &body.authentication_token.token)
            .await?;

        assert_eq!(resolved.id, user.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() -> TestResult {
        let state = memory_state();

        user_with_password(&state, "alice@example.com", "pa55word", true).await?;

        for input in [
            json!({"email": "alice@example.com", "password": "wrong-password"}),
            json!({"email": "nobody@example.com", "password": "pa55word"}),
        ] {
            let mut res = TestClient::post("http://example.com/v1/tokens/authentication")
                .json(&input)
                .send(&make_service(Arc::clone(&state)))
                .await;

            assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

            let body: Value = res.take_json().await?;

            assert_eq!(body, json!({"error": "invalid authentication credentials"}));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_input_returns_422() {
        let res = TestClient::post("http://example.com/v1/tokens/authentication")
            .json(&json!({"email": "not-an-email"}))
            .send(&make_service(memory_state()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));
    }
}
