//! Token Authority: scoped, expiring, opaque bearer tokens.

mod errors;
mod models;
mod repository;
mod service;
mod token;

pub use errors::*;
pub use models::*;
pub use repository::*;
pub use service::*;
pub use token::*;
