//! Token models.

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::users::UserId;

/// What a token may be used for. Tokens of one scope never resolve under
/// another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenScope {
    Activation,
    Authentication,
    PasswordReset,
}

impl TokenScope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::Authentication => "authentication",
            Self::PasswordReset => "password-reset",
        }
    }

    /// Lifetime handlers give newly issued tokens of this scope.
    #[must_use]
    pub const fn default_ttl(self) -> SignedDuration {
        match self {
            Self::Activation => SignedDuration::from_hours(3 * 24),
            Self::Authentication => SignedDuration::from_hours(24),
            Self::PasswordReset => SignedDuration::from_mins(45),
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The token string handed to the client. Only ever held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPlaintext(String);

impl TokenPlaintext {
    #[must_use]
    pub fn new(plaintext: String) -> Self {
        Self(plaintext)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TokenPlaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPlaintext(**redacted**)")
    }
}

impl Drop for TokenPlaintext {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// SHA-256 digest of a token plaintext; the only form that is stored.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenHash([u8; 32]);

impl TokenHash {
    #[must_use]
    pub fn of(plaintext: &str) -> Self {
        Self(Sha256::digest(plaintext.as_bytes()).into())
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenHash(")?;

        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }

        f.write_str(")")
    }
}

/// A freshly issued token, plaintext included.
#[derive(Debug, Clone)]
pub struct Token {
    pub plaintext: TokenPlaintext,
    pub hash: TokenHash,
    pub user_id: UserId,
    pub expiry: Timestamp,
    pub scope: TokenScope,
}

impl Token {
    /// The persisted form of this token.
    #[must_use]
    pub fn record(&self) -> TokenRecord {
        TokenRecord {
            hash: self.hash,
            user_id: self.user_id,
            expiry: self.expiry,
            scope: self.scope,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRecord {
    pub hash: TokenHash,
    pub user_id: UserId,
    pub expiry: Timestamp,
    pub scope: TokenScope,
}

impl TokenRecord {
    /// Whether the token is still usable at `now`.
    #[must_use]
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        now < self.expiry
    }
}
