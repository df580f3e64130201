//! Products

mod errors;
mod models;
mod repository;

pub use errors::ProductsError;
pub use models::*;
pub use repository::*;
