//! Users

mod errors;
mod models;
mod password;
mod repository;
mod validation;

pub use errors::UsersError;
pub use models::*;
pub use password::{PasswordError, PasswordHash};
pub use repository::*;
pub use validation::*;
