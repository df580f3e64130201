//! Users

mod errors;
pub(crate) mod handlers;
mod models;

use turnstile_app::users::PasswordHash;

use crate::{errors::ApiError, extensions::*};

pub(crate) use errors::into_api_error;
pub(crate) use models::UserEnvelope;

/// Capability codes every newly registered user receives.
pub(crate) const DEFAULT_PERMISSIONS: [&str; 1] = ["products:read"];

/// Hash `plaintext` off the async workers.
pub(crate) async fn hash_password(plaintext: String) -> Result<PasswordHash, ApiError> {
    tokio::task::spawn_blocking(move || PasswordHash::from_plaintext(&plaintext))
        .await
        .or_500("password hashing task failed")?
        .or_500("failed to hash password")
}

/// Check `plaintext` against `hash` off the async workers.
pub(crate) async fn verify_password(hash: PasswordHash, plaintext: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || hash.matches(&plaintext))
        .await
        .or_500("password verification task failed")?
        .or_500("failed to verify password")
}
