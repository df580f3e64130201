//! User Handlers

pub(crate) mod activate;
pub(crate) mod password;
pub(crate) mod register;
