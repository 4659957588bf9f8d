//! Repository for the `sessions` table.

use sqlx::PgPool;

use crate::models::session::{ActiveSession, CreateSession, Session};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "token, user_id, expires_at, created_at";

/// Provides create / lookup / delete operations for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (token, user_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(&input.token)
            .bind(input.user_id)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find an unexpired session by token, joined with its user.
    ///
    /// Expiry is judged by the database clock (`expires_at > NOW()`).
    pub async fn find_active_with_user(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<ActiveSession>, sqlx::Error> {
        sqlx::query_as::<_, ActiveSession>(
            "SELECT s.token, s.user_id, s.expires_at, u.username, u.role
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token = $1
               AND s.expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Delete a session by token. Returns `true` if a row was removed;
    /// an unknown token is not an error.
    pub async fn delete_by_token(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete up to `batch_size` expired sessions. Returns the count of deleted rows.
    pub async fn delete_expired(pool: &PgPool, batch_size: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM sessions
             WHERE token IN (
                 SELECT token FROM sessions
                 WHERE expires_at <= NOW()
                 LIMIT $1
             )",
        )
        .bind(batch_size)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
