//! Token Authority.

use std::{fmt, sync::Arc};

use jiff::SignedDuration;
use tracing::warn;

use crate::{
    auth::{AuthServiceError, Token, TokenError, TokenHash, TokenScope, TokensRepository, issue_token},
    clock::Clock,
    users::{User, UserId},
};

/// Issues, stores, resolves and revokes scoped bearer tokens.
#[derive(Clone)]
pub struct TokenAuthority {
    repository: Arc<dyn TokensRepository>,
    clock: Arc<dyn Clock>,
}

impl TokenAuthority {
    #[must_use]
    pub fn new(repository: Arc<dyn TokensRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Generate a token for `user_id` valid for `ttl`. Nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error when entropy is unavailable or the expiry overflows.
    pub fn issue(
        &self,
        user_id: UserId,
        ttl: SignedDuration,
        scope: TokenScope,
    ) -> Result<Token, TokenError> {
        issue_token(user_id, ttl, scope, self.clock.now())
    }

    /// Store the hashed form of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthServiceError::Duplicate`] on a hash collision and
    /// [`AuthServiceError::Sql`] when storage is unreachable.
    pub async fn persist(&self, token: &Token) -> Result<(), AuthServiceError> {
        self.repository.insert_token(&token.record()).await
    }

    /// Issue and persist a token, regenerating once if the hash collides.
    ///
    /// # Errors
    ///
    /// Returns an error when issuing fails, storage fails, or the retry
    /// collides again.
    pub async fn create(
        &self,
        user_id: UserId,
        ttl: SignedDuration,
        scope: TokenScope,
    ) -> Result<Token, AuthServiceError> {
        let token = self.issue(user_id, ttl, scope)?;

        match self.persist(&token).await {
            Ok(()) => Ok(token),
            Err(AuthServiceError::Duplicate) => {
                warn!(%scope, "token hash collided, regenerating");

                let token = self.issue(user_id, ttl, scope)?;

                self.persist(&token).await?;

                Ok(token)
            }
            Err(error) => Err(error),
        }
    }

    /// The user owning a live token of `scope` with this plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`AuthServiceError::NotFound`] for unknown, expired or
    /// wrong-scope tokens.
    pub async fn resolve(
        &self,
        scope: TokenScope,
        plaintext: &str,
    ) -> Result<User, AuthServiceError> {
        let hash = TokenHash::of(plaintext);

        self.repository
            .find_user_for_token(scope, &hash, self.clock.now())
            .await
    }

    /// Delete every token of `scope` owned by `user_id`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error when storage fails.
    pub async fn revoke_all(
        &self,
        scope: TokenScope,
        user_id: UserId,
    ) -> Result<(), AuthServiceError> {
        self.repository.delete_tokens_for_user(scope, user_id).await
    }
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority").finish_non_exhaustive()
    }
}
