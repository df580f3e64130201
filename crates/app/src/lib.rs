//! Users, tokens, permissions and products for the Turnstile API, with
//! `PostgreSQL` and in-memory storage.

pub mod auth;
pub mod clock;
pub mod context;
pub mod database;
pub mod ids;
pub mod lifecycle;
pub mod mail;
pub mod memory;
pub mod permissions;
pub mod products;
pub mod users;
pub mod validator;
