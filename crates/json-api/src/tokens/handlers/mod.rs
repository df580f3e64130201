//! Token Handlers

pub(crate) mod authentication;
pub(crate) mod password_reset;
