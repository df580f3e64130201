//! Permission Registry: per-user capability codes.

mod repository;

use std::{collections::BTreeSet, fmt, sync::Arc};

use serde::Serialize;
use sqlx::Error;
use thiserror::Error;

pub use repository::*;

use crate::users::UserId;

#[derive(Debug, Error)]
pub enum PermissionsError {
    #[error("storage error")]
    Sql(#[from] Error),
}

/// Ordered set of capability codes held by one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    /// Exact-match membership; codes have no hierarchy or wildcards.
    #[must_use]
    pub fn includes(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Clone)]
pub struct PermissionRegistry {
    repository: Arc<dyn PermissionsRepository>,
}

impl PermissionRegistry {
    #[must_use]
    pub fn new(repository: Arc<dyn PermissionsRepository>) -> Self {
        Self { repository }
    }

    /// Every code granted to `user_id`; empty when none were.
    ///
    /// # Errors
    ///
    /// Returns an error when storage fails.
    pub async fn load_for_user(&self, user_id: UserId) -> Result<Permissions, PermissionsError> {
        self.repository.permissions_for_user(user_id).await
    }

    /// Grant `codes` to `user_id`. Codes the user already holds are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when storage fails.
    pub async fn grant(&self, user_id: UserId, codes: &[String]) -> Result<(), PermissionsError> {
        if codes.is_empty() {
            return Ok(());
        }

        self.repository.grant_permissions(user_id, codes).await
    }
}

impl fmt::Debug for PermissionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionRegistry").finish_non_exhaustive()
    }
}
