//! Permissions repository.

use async_trait::async_trait;
use mockall::automock;
use sqlx::{PgPool, query, query_scalar};

use crate::{
    permissions::{Permissions, PermissionsError},
    users::UserId,
};

const PERMISSIONS_FOR_USER_SQL: &str = include_str!("sql/permissions_for_user.sql");
const GRANT_PERMISSIONS_SQL: &str = include_str!("sql/grant_permissions.sql");

#[automock]
#[async_trait]
pub trait PermissionsRepository: Send + Sync {
    async fn permissions_for_user(&self, user_id: UserId) -> Result<Permissions, PermissionsError>;

    async fn grant_permissions(
        &self,
        user_id: UserId,
        codes: &[String],
    ) -> Result<(), PermissionsError>;
}

#[derive(Debug, Clone)]
pub struct PgPermissionsRepository {
    pool: PgPool,
}

impl PgPermissionsRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionsRepository for PgPermissionsRepository {
    async fn permissions_for_user(&self, user_id: UserId) -> Result<Permissions, PermissionsError> {
        let codes: Vec<String> = query_scalar(PERMISSIONS_FOR_USER_SQL)
            .bind(user_id.into_inner())
            .fetch_all(&self.pool)
            .await?;

        Ok(codes.into_iter().collect())
    }

    async fn grant_permissions(
        &self,
        user_id: UserId,
        codes: &[String],
    ) -> Result<(), PermissionsError> {
        query(GRANT_PERMISSIONS_SQL)
            .bind(user_id.into_inner())
            .bind(codes)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
