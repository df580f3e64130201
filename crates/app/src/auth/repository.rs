//! Tokens repository.

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use mockall::automock;
use sqlx::{PgPool, Postgres, query, query_as};

use crate::{
    auth::{AuthServiceError, TokenHash, TokenRecord, TokenScope},
    users::{User, UserId},
};

const INSERT_TOKEN_SQL: &str = include_str!("sql/insert_token.sql");
const FIND_USER_FOR_TOKEN_SQL: &str = include_str!("sql/find_user_for_token.sql");
const DELETE_TOKENS_FOR_USER_SQL: &str = include_str!("sql/delete_tokens_for_user.sql");

#[automock]
#[async_trait]
pub trait TokensRepository: Send + Sync {
    /// Store a token record. Hash collisions fail with
    /// [`AuthServiceError::Duplicate`].
    async fn insert_token(&self, token: &TokenRecord) -> Result<(), AuthServiceError>;

    /// The owner of a token with this hash and scope that is still live at
    /// `now`.
    async fn find_user_for_token(
        &self,
        scope: TokenScope,
        hash: &TokenHash,
        now: Timestamp,
    ) -> Result<User, AuthServiceError>;

    /// Remove every token of `scope` owned by `user_id`.
    async fn delete_tokens_for_user(
        &self,
        scope: TokenScope,
        user_id: UserId,
    ) -> Result<(), AuthServiceError>;
}

#[derive(Debug, Clone)]
pub struct PgTokensRepository {
    pool: PgPool,
}

impl PgTokensRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokensRepository for PgTokensRepository {
    async fn insert_token(&self, token: &TokenRecord) -> Result<(), AuthServiceError> {
        query(INSERT_TOKEN_SQL)
            .bind(token.hash.as_bytes().as_slice())
            .bind(token.user_id.into_inner())
            .bind(SqlxTimestamp::from(token.expiry))
            .bind(token.scope.as_str())
            .execute(&self.pool)
            .await
            .map_err(AuthServiceError::from)?;

        Ok(())
    }

    async fn find_user_for_token(
        &self,
        scope: TokenScope,
        hash: &TokenHash,
        now: Timestamp,
    ) -> Result<User, AuthServiceError> {
        query_as::<Postgres, User>(FIND_USER_FOR_TOKEN_SQL)
            .bind(hash.as_bytes().as_slice())
            .bind(scope.as_str())
            .bind(SqlxTimestamp::from(now))
            .fetch_optional(&self.pool)
            .await
            .map_err(AuthServiceError::from)?
            .ok_or(AuthServiceError::NotFound)
    }

    async fn delete_tokens_for_user(
        &self,
        scope: TokenScope,
        user_id: UserId,
    ) -> Result<(), AuthServiceError> {
        query(DELETE_TOKENS_FOR_USER_SQL)
            .bind(scope.as_str())
            .bind(user_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(AuthServiceError::from)?;

        Ok(())
    }
}
