//! Argon2 password hashing.

use std::fmt;

use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{self, PasswordHash as PhcString, SaltString},
};
use rand::{RngCore, rngs::OsRng};
use thiserror::Error;
use zeroize::Zeroize;

const SALT_BYTES: usize = 16;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to read from the OS entropy source")]
    Entropy(#[source] rand::Error),

    #[error("password hashing failed")]
    Hash(#[source] password_hash::Error),
}

/// PHC-formatted argon2id hash of a user's password.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash `plaintext` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns an error when the entropy source or the hasher fails.
    pub fn from_plaintext(plaintext: &str) -> Result<Self, PasswordError> {
        let mut salt = [0_u8; SALT_BYTES];

        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(PasswordError::Entropy)?;

        let encoded = SaltString::encode_b64(&salt).map_err(PasswordError::Hash);

        salt.zeroize();

        let encoded = encoded?;
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &encoded)
            .map_err(PasswordError::Hash)?;

        Ok(Self(hash.to_string()))
    }

    /// Wrap a hash loaded from storage.
    #[must_use]
    pub fn from_phc(phc: String) -> Self {
        Self(phc)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `plaintext` hashes to this value.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored hash is not a valid PHC string.
    pub fn matches(&self, plaintext: &str) -> Result<bool, PasswordError> {
        let parsed = PhcString::new(&self.0).map_err(PasswordError::Hash)?;

        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(error) => Err(PasswordError::Hash(error)),
        }
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(**redacted**)")
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn hash_matches_only_the_original_password() -> TestResult {
        let hash = PasswordHash::from_plaintext("pa55word1234")?;

        assert!(hash.matches("pa55word1234")?, "original password matches");
        assert!(!hash.matches("pa55word12345")?, "other password does not");
        assert_ne!(hash.as_str(), "pa55word1234", "plaintext is never stored");

        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> TestResult {
        let first = PasswordHash::from_plaintext("pa55word1234")?;
        let second = PasswordHash::from_plaintext("pa55word1234")?;

        assert_ne!(first, second, "each hash gets its own salt");

        Ok(())
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        let hash = PasswordHash::from_phc("not-a-phc-string".to_string());

        assert!(hash.matches("anything").is_err(), "cannot parse hash");
    }

    #[test]
    fn debug_output_is_redacted() {
        let hash = PasswordHash::from_phc("$argon2id$secret".to_string());

        assert_eq!(format!("{hash:?}"), "PasswordHash(**redacted**)");
    }
}
