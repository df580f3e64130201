//! App Context

use std::{fmt, sync::Arc};

use sqlx::migrate::MigrateError;
use thiserror::Error;
use tracing::info;

use crate::{
    auth::{PgTokensRepository, TokenAuthority},
    clock::{Clock, SystemClock},
    database::{self, PoolSettings},
    lifecycle::BackgroundTasks,
    mail::{LogMailer, Mailer},
    memory::MemoryStore,
    permissions::{PermissionRegistry, PgPermissionsRepository},
    products::{PgProductsRepository, ProductsRepository},
    users::{PgUsersRepository, UsersRepository},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrate(#[source] MigrateError),
}

#[derive(Clone)]
pub struct AppContext {
    pub users: Arc<dyn UsersRepository>,
    pub tokens: TokenAuthority,
    pub permissions: PermissionRegistry,
    pub products: Arc<dyn ProductsRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub tasks: BackgroundTasks,
}

impl AppContext {
    /// Build application context backed by `PostgreSQL`, applying pending
    /// migrations first.
    ///
    /// # Errors
    ///
    /// Returns an error when connecting or migrating fails.
    pub async fn postgres(url: &str, settings: &PoolSettings) -> Result<Self, AppInitError> {
        let pool = database::connect(url, settings)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migrate)?;

        info!("database migrations applied");

        Ok(Self {
            users: Arc::new(PgUsersRepository::new(pool.clone())),
            tokens: TokenAuthority::new(
                Arc::new(PgTokensRepository::new(pool.clone())),
                Arc::new(SystemClock),
            ),
            permissions: PermissionRegistry::new(Arc::new(PgPermissionsRepository::new(
                pool.clone(),
            ))),
            products: Arc::new(PgProductsRepository::new(pool)),
            mailer: Arc::new(LogMailer),
            tasks: BackgroundTasks::new(),
        })
    }

    /// Build application context backed by a fresh [`MemoryStore`].
    #[must_use]
    pub fn memory(clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(MemoryStore::new());

        Self {
            users: store.clone(),
            tokens: TokenAuthority::new(store.clone(), clock),
            permissions: PermissionRegistry::new(store.clone()),
            products: store,
            mailer: Arc::new(LogMailer),
            tasks: BackgroundTasks::new(),
        }
    }

    #[must_use]
    pub fn with_mailer(self, mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer, ..self }
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("tokens", &self.tokens)
            .field("permissions", &self.permissions)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        auth::TokenScope,
        clock::ManualClock,
        users::{NewUser, PasswordHash},
    };

    #[tokio::test]
    async fn memory_context_shares_one_store() -> TestResult {
        let ctx = AppContext::memory(Arc::new(ManualClock::default()));

        let user = ctx
            .users
            .insert_user(NewUser {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                password: PasswordHash::from_phc("$argon2id$stub".to_string()),
                activated: true,
            })
            .await?;

        let token = ctx
            .tokens
            .create(
                user.id,
                TokenScope::Authentication.default_ttl(),
                TokenScope::Authentication,
            )
            .await?;

        let resolved = ctx
            .tokens
            .resolve(TokenScope::Authentication, token.plaintext.as_str())
            .await?;

        assert_eq!(resolved, user);

        Ok(())
    }
}
