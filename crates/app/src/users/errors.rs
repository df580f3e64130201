//! Users errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::users::PasswordError;

#[derive(Debug, Error)]
pub enum UsersError {
    #[error("user not found")]
    NotFound,

    #[error("a user with this email address already exists")]
    DuplicateEmail,

    #[error("user was modified concurrently")]
    EditConflict,

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("password error")]
    Password(#[from] PasswordError),
}

impl From<Error> for UsersError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::DuplicateEmail,
            Some(_) | None => Self::Sql(error),
        }
    }
}
