//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studio_auth_core::types::DbId;

/// The slice of a `users` row the session core reads.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserView`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    /// `NULL` until the account has been given a credential.
    pub password_hash: Option<String>,
    pub role: String,
}

/// Minimal user projection returned to clients (no id, no credential).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub username: String,
    pub role: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role.clone(),
        }
    }
}

/// DTO for creating a new user. Registration lives outside this service;
/// this exists for seeding and tests.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password_hash: Option<String>,
    pub role: String,
}
