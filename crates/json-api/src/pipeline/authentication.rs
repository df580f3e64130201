//! Bearer token authentication.

use std::sync::Arc;

use salvo::{
    http::header::{AUTHORIZATION, HeaderValue, VARY},
    prelude::*,
};
use tokio::time::timeout;
use tracing::error;
use turnstile_app::{
    auth::{AuthServiceError, TokenScope, validate_token_plaintext},
    users::User,
    validator::Validator,
};

use crate::{errors::ApiError, extensions::*, pipeline::Identity, state::State};

/// Resolves the `Authorization` header into an [`Identity`]. Requests
/// without the header continue anonymously; a malformed or unknown token
/// stops the request with 401.
#[handler]
pub(crate) async fn authenticate(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    res.headers_mut()
        .append(VARY, HeaderValue::from_static("Authorization"));

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map(str::to_owned));

    let identity = match header {
        None => Ok(Identity::Anonymous),
        Some(Err(_not_ascii)) => Err(ApiError::InvalidToken),
        Some(Ok(header)) => resolve_identity(depot, &header).await,
    };

    match identity {
        Ok(identity) => {
            depot.inject(identity);

            ctrl.call_next(req, depot, res).await;
        }
        Err(error) => {
            res.render(error);

            ctrl.skip_rest();
        }
    }
}

async fn resolve_identity(depot: &Depot, header: &str) -> Result<Identity, ApiError> {
    let token = bearer_token(header).ok_or(ApiError::InvalidToken)?;

    let mut v = Validator::new();

    validate_token_plaintext(&mut v, token);

    if !v.is_valid() {
        return Err(ApiError::InvalidToken);
    }

    let state = depot.obtain_or_500::<Arc<State>>()?;

    let user = lookup_user(state, token).await?;

    Ok(Identity::User(Box::new(user)))
}

async fn lookup_user(state: &State, token: &str) -> Result<User, ApiError> {
    let lookup = state.app.tokens.resolve(TokenScope::Authentication, token);

    match timeout(state.storage_deadline, lookup).await {
        Err(_elapsed) => {
            error!("token lookup exceeded the storage deadline");

            Err(ApiError::Unavailable)
        }
        Ok(Ok(user)) => Ok(user),
        Ok(Err(AuthServiceError::NotFound)) => Err(ApiError::InvalidToken),
        Ok(Err(source)) => {
            error!("failed to resolve authentication token: {source}");

            Err(ApiError::Internal)
        }
    }
}

/// The credential of a `Bearer <token>` header. The scheme is matched
/// exactly and the header must hold exactly two space separated parts.
fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');

    let scheme = parts.next()?;
    let token = parts.next()?;

    if scheme != "Bearer" || parts.next().is_some() {
        return None;
    }

    Some(token)
}
