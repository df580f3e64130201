//! Token generation and plaintext checks.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jiff::{SignedDuration, Timestamp};
use rand::{RngCore, rngs::OsRng};
use thiserror::Error;
use zeroize::Zeroize;

use crate::{
    auth::{Token, TokenHash, TokenPlaintext, TokenScope},
    users::UserId,
    validator::Validator,
};

/// Random bytes behind every token.
pub const TOKEN_BYTES: usize = 32;

/// Length of an encoded plaintext (unpadded base64 of [`TOKEN_BYTES`]).
pub const TOKEN_PLAINTEXT_LEN: usize = 43;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to read from the OS entropy source")]
    Entropy(#[source] rand::Error),

    #[error("token expiry is out of range")]
    Expiry(#[source] jiff::Error),
}

/// Encode fresh OS randomness as a URL-safe token plaintext.
///
/// # Errors
///
/// Returns [`TokenError::Entropy`] when the OS entropy source fails.
pub fn generate_plaintext() -> Result<TokenPlaintext, TokenError> {
    let mut bytes = [0_u8; TOKEN_BYTES];

    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(TokenError::Entropy)?;

    let plaintext = URL_SAFE_NO_PAD.encode(bytes);

    bytes.zeroize();

    Ok(TokenPlaintext::new(plaintext))
}

/// Build a token for `user_id` expiring `ttl` after `now`. Nothing is stored.
///
/// # Errors
///
/// Returns an error when entropy is unavailable or the expiry overflows.
pub fn issue_token(
    user_id: UserId,
    ttl: SignedDuration,
    scope: TokenScope,
    now: Timestamp,
) -> Result<Token, TokenError> {
    let expiry = now.checked_add(ttl).map_err(TokenError::Expiry)?;
    let plaintext = generate_plaintext()?;
    let hash = TokenHash::of(plaintext.as_str());

    Ok(Token {
        plaintext,
        hash,
        user_id,
        expiry,
        scope,
    })
}

pub fn validate_token_plaintext(v: &mut Validator, token: &str) {
    v.check(!token.trim().is_empty(), "token", "must be provided");
    v.check(
        token.len() == TOKEN_PLAINTEXT_LEN,
        "token",
        "must be 43 bytes long",
    );
}
