//! User Errors

use tracing::error;
use turnstile_app::{users::UsersError, validator::ValidationErrors};

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: UsersError) -> ApiError {
    match error {
        UsersError::NotFound => ApiError::NotFound,
        UsersError::DuplicateEmail => ValidationErrors::single(
            "email",
            "a user with this email address already exists",
        )
        .into(),
        UsersError::EditConflict => ApiError::EditConflict,
        UsersError::Sql(source) => {
            error!("users storage failure: {source}");

            ApiError::Internal
        }
        UsersError::Password(source) => {
            error!("password hashing failure: {source}");

            ApiError::Internal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_is_a_field_error() {
        let ApiError::Validation(errors) = into_api_error(UsersError::DuplicateEmail) else {
            std::panic::panic_any("expected a validation error");
        };

        assert_eq!(
            errors.get("email"),
            Some("a user with this email address already exists")
        );
    }

    #[test]
    fn edit_conflict_maps_to_409() {
        assert_eq!(
            into_api_error(UsersError::EditConflict).status(),
            salvo::http::StatusCode::CONFLICT
        );
    }
}
