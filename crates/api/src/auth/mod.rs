//! Session authentication.
//!
//! - [`service`] -- login, validation and logout over a [`SessionStore`](studio_auth_db::store::SessionStore).
//! - [`cookie`] -- the session cookie and where a request carries its token.

pub mod cookie;
pub mod service;

pub use service::{
    LoginError, LoginResponse, LoginSuccess, LogoutResponse, SessionRejection, SessionService,
    SessionUser,
};
