//! Test helpers.

use std::{sync::Arc, time::Duration};

use turnstile_app::{
    auth::{AuthServiceError, TokenAuthority, TokenScope, TokensRepository},
    clock::SystemClock,
    context::AppContext,
    permissions::PermissionsError,
    users::{NewUser, PasswordHash, User, UsersError},
};

use crate::{observability::Metrics, state::State};

pub(crate) const TEST_STORAGE_DEADLINE: Duration = Duration::from_secs(3);

#[expect(
    clippy::expect_used,
    reason = "metric names are static and registered once per registry"
)]
fn metrics() -> Arc<Metrics> {
    Arc::new(Metrics::new().expect("metrics should register"))
}

pub(crate) fn state_with_app(app: AppContext) -> Arc<State> {
    State::new(app, "test".to_string(), TEST_STORAGE_DEADLINE, metrics())
}

pub(crate) fn memory_state() -> Arc<State> {
    state_with_app(AppContext::memory(Arc::new(SystemClock)))
}

/// In-memory state whose token lookups go to `tokens` instead.
pub(crate) fn state_with_tokens(
    tokens: Arc<dyn TokensRepository>,
    storage_deadline: Duration,
) -> Arc<State> {
    let app = AppContext {
        tokens: TokenAuthority::new(tokens, Arc::new(SystemClock)),
        ..AppContext::memory(Arc::new(SystemClock))
    };

    State::new(app, "test".to_string(), storage_deadline, metrics())
}

async fn insert_user(
    state: &State,
    email: &str,
    password: PasswordHash,
    activated: bool,
) -> Result<User, UsersError> {
    state
        .app
        .users
        .insert_user(NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password,
            activated,
        })
        .await
}

pub(crate) async fn activated_user(state: &State, email: &str) -> Result<User, UsersError> {
    insert_user(state, email, stub_password(), true).await
}

pub(crate) async fn inactive_user(state: &State, email: &str) -> Result<User, UsersError> {
    insert_user(state, email, stub_password(), false).await
}

/// A user whose password really is `password`, for login flows.
pub(crate) async fn user_with_password(
    state: &State,
    email: &str,
    password: &str,
    activated: bool,
) -> Result<User, UsersError> {
    let hash = PasswordHash::from_plaintext(password)?;

    insert_user(state, email, hash, activated).await
}

fn stub_password() -> PasswordHash {
    PasswordHash::from_phc("$argon2id$v=19$m=19456,t=2,p=1$c3R1Yg$c3R1Yg".to_string())
}

pub(crate) async fn auth_token(state: &State, user: &User) -> Result<String, AuthServiceError> {
    let token = state
        .app
        .tokens
        .create(
            user.id,
            TokenScope::Authentication.default_ttl(),
            TokenScope::Authentication,
        )
        .await?;

    Ok(token.plaintext.as_str().to_owned())
}

pub(crate) async fn grant(state: &State, user: &User, code: &str) -> Result<(), PermissionsError> {
    state
        .app
        .permissions
        .grant(user.id, &[code.to_string()])
        .await
}
