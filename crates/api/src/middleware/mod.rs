//! Authentication extractors.
//!
//! - [`auth::AuthUser`] -- Resolves the caller from trusted identity headers or
//!   a session token.

pub mod auth;
