//! Session model and DTOs.

use sqlx::FromRow;
use studio_auth_core::types::{DbId, Timestamp};

/// A row from the `sessions` table. The token is the primary key.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: DbId,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// An unexpired session joined with the owning user's name and role.
#[derive(Debug, Clone, FromRow)]
pub struct ActiveSession {
    pub token: String,
    pub user_id: DbId,
    pub expires_at: Timestamp,
    pub username: String,
    pub role: String,
}

/// DTO for creating a new session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub token: String,
    pub user_id: DbId,
    pub expires_at: Timestamp,
}
