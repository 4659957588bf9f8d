//! The session store seam used by the session service.
//!
//! [`SessionStore`] is object-safe so the service can hold an
//! `Arc<dyn SessionStore>`; [`PgSessionStore`] is the PostgreSQL implementation
//! backed by the shared [`ConnectionManager`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::session::{ActiveSession, CreateSession};
use crate::models::user::User;
use crate::repositories::{SessionRepo, UserRepo};
use crate::ConnectionManager;

/// A connection or query failure in the auth store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the fault is about reaching the store rather than a bad query.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            StoreError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}

/// Single-statement operations over users and sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn create_session(&self, input: &CreateSession) -> Result<(), StoreError>;

    /// Session joined with its user, only if `expires_at` is in the future.
    async fn find_active_session_with_user(
        &self,
        token: &str,
    ) -> Result<Option<ActiveSession>, StoreError>;

    /// Returns `true` if a row was removed. Unknown tokens are not an error.
    async fn delete_session(&self, token: &str) -> Result<bool, StoreError>;

    /// Remove up to `batch_size` expired sessions, returning how many went.
    async fn delete_expired_sessions(&self, batch_size: i64) -> Result<u64, StoreError>;
}

/// [`SessionStore`] over PostgreSQL.
#[derive(Clone)]
pub struct PgSessionStore {
    connections: Arc<ConnectionManager>,
}

impl PgSessionStore {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let pool = self.connections.get().await?;
        Ok(UserRepo::find_by_username(pool, username).await?)
    }

    async fn create_session(&self, input: &CreateSession) -> Result<(), StoreError> {
        let pool = self.connections.get().await?;
        SessionRepo::create(pool, input).await?;
        Ok(())
    }

    async fn find_active_session_with_user(
        &self,
        token: &str,
    ) -> Result<Option<ActiveSession>, StoreError> {
        let pool = self.connections.get().await?;
        Ok(SessionRepo::find_active_with_user(pool, token).await?)
    }

    async fn delete_session(&self, token: &str) -> Result<bool, StoreError> {
        let pool = self.connections.get().await?;
        Ok(SessionRepo::delete_by_token(pool, token).await?)
    }

    async fn delete_expired_sessions(&self, batch_size: i64) -> Result<u64, StoreError> {
        let pool = self.connections.get().await?;
        Ok(SessionRepo::delete_expired(pool, batch_size).await?)
    }
}
