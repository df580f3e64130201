//! User response bodies.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use turnstile_app::users::User;

/// Public view of a user; the password hash and version never leave the
/// server.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UserResponse {
    pub id: i64,
    pub created_at: Timestamp,
    pub name: String,
    pub email: String,
    pub activated: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.into_inner(),
            created_at: user.created_at,
            name: user.name.clone(),
            email: user.email.clone(),
            activated: user.activated,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: UserResponse,
}

impl From<&User> for UserEnvelope {
    fn from(user: &User) -> Self {
        Self { user: user.into() }
    }
}
