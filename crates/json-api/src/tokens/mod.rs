//! Tokens

pub(crate) mod handlers;
