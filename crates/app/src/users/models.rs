//! User models.

use jiff::Timestamp;

use crate::{ids::TypedId, users::PasswordHash};

pub type UserId = TypedId<User>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub created_at: Timestamp,
    pub name: String,
    pub email: String,
    pub password: PasswordHash,
    pub activated: bool,

    /// Incremented on every update; stale writes fail with an edit conflict.
    pub version: i32,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: PasswordHash,
    pub activated: bool,
}
