//! Products

mod errors;
pub(crate) mod handlers;

pub(crate) use errors::into_api_error;
