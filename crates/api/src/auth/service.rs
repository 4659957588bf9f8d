//! Session lifecycle: login, validation and logout.
//!
//! The service is the error boundary for authentication. Nothing it returns is
//! a raw store error: login yields a [`LoginError`], validation yields `None`,
//! logout yields `success: false`. Store faults are logged here with detail.
//!
//! A session moves `absent -> active` on login, becomes `expired` when its
//! `expires_at` passes (the row stays until logout or the reaper removes it),
//! and goes back to `absent` on logout from either state.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use studio_auth_core::credential::CredentialVerifier;
use studio_auth_core::session_token::{
    generate_session_token, is_well_formed, redact, DEFAULT_SESSION_TTL_DAYS,
};
use studio_auth_core::types::{DbId, Timestamp};
use studio_auth_db::models::session::CreateSession;
use studio_auth_db::models::user::UserView;
use studio_auth_db::store::{SessionStore, StoreError};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub token: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub user: UserView,
}

/// Why a login did not produce a session.
///
/// Unknown usernames and wrong secrets share one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication unavailable")]
    Unavailable,
}

/// Identity behind a valid session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user: String,
    pub role: String,
    pub user_id: DbId,
}

/// Why a token did not resolve to a session.
///
/// Callers at the request boundary collapse all of these to
/// "unauthenticated"; the distinction exists for logs.
#[derive(Debug, thiserror::Error)]
pub enum SessionRejection {
    #[error("no session token presented")]
    Missing,
    #[error("token is not a session token")]
    Malformed,
    #[error("session not found or expired")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

/// Result of a logout call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Wire shape of a login result:
/// `{success: true, token, user}` or `{success: false, error}`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Result<LoginSuccess, LoginError>> for LoginResponse {
    fn from(result: &Result<LoginSuccess, LoginError>) -> Self {
        match result {
            Ok(success) => Self {
                success: true,
                token: Some(success.token.clone()),
                user: Some(success.user.clone()),
                error: None,
            },
            Err(e) => Self {
                success: false,
                token: None,
                user: None,
                error: Some(e.to_string()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Orchestrates credential checks and session rows.
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    verifier: Arc<dyn CredentialVerifier>,
    ttl: Duration,
}

impl SessionService {
    /// Build a service issuing sessions that last [`DEFAULT_SESSION_TTL_DAYS`].
    pub fn new(store: Arc<dyn SessionStore>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            store,
            verifier,
            ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Verify `username` / `password` and, on success, persist a new session.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, LoginError> {
        let user = self
            .store
            .find_user_by_username(username)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Login failed: could not load user");
                LoginError::Unavailable
            })?;

        // Verify even when the user is unknown.
        let stored = user.as_ref().and_then(|u| u.password_hash.as_deref());
        let verified = self.verifier.verify(stored, password);

        let user = match user {
            Some(user) if verified => user,
            _ => {
                tracing::info!("Login rejected: invalid credentials");
                return Err(LoginError::InvalidCredentials);
            }
        };

        let token = generate_session_token();
        let issued_at = Utc::now();
        let expires_at = issued_at.checked_add_signed(self.ttl).ok_or_else(|| {
            tracing::error!(
                ttl_secs = self.ttl.num_seconds(),
                "Login failed: session expiry out of range"
            );
            LoginError::Unavailable
        })?;

        let input = CreateSession {
            token,
            user_id: user.id,
            expires_at,
        };
        self.store.create_session(&input).await.map_err(|e| {
            tracing::error!(error = %e, user_id = user.id, "Login failed: could not persist session");
            LoginError::Unavailable
        })?;

        tracing::info!(
            user_id = user.id,
            token = %redact(&input.token),
            %expires_at,
            "Session created"
        );

        Ok(LoginSuccess {
            token: input.token,
            issued_at,
            expires_at,
            user: UserView::from(&user),
        })
    }

    /// Resolve `token` to its user, keeping the reason when it does not.
    pub async fn check(&self, token: &str) -> Result<SessionUser, SessionRejection> {
        if token.is_empty() {
            return Err(SessionRejection::Missing);
        }
        if !is_well_formed(token) {
            return Err(SessionRejection::Malformed);
        }

        let session = self
            .store
            .find_active_session_with_user(token)
            .await?
            .ok_or(SessionRejection::NotFound)?;

        Ok(SessionUser {
            user: session.username,
            role: session.role,
            user_id: session.user_id,
        })
    }

    /// Resolve `token` to its user. Fails closed: any problem is `None`.
    pub async fn validate(&self, token: &str) -> Option<SessionUser> {
        match self.check(token).await {
            Ok(user) => Some(user),
            Err(SessionRejection::Unavailable(e)) => {
                tracing::error!(
                    error = %e,
                    unreachable = e.is_unreachable(),
                    "Session validation failed: store error"
                );
                None
            }
            Err(rejection) => {
                tracing::debug!(reason = %rejection, "Session rejected");
                None
            }
        }
    }

    /// Revoke the session behind `token`. Unknown tokens succeed.
    pub async fn logout(&self, token: &str) -> LogoutResponse {
        if !is_well_formed(token) {
            // Nothing that could have been issued, so nothing to revoke.
            return LogoutResponse { success: true };
        }

        match self.store.delete_session(token).await {
            Ok(removed) => {
                tracing::info!(token = %redact(token), removed, "Session revoked");
                LogoutResponse { success: true }
            }
            Err(e) => {
                tracing::error!(error = %e, "Logout failed: could not delete session");
                LogoutResponse { success: false }
            }
        }
    }

    /// Remove up to `batch_size` expired sessions. Used by the reaper.
    pub async fn purge_expired(&self, batch_size: i64) -> Result<u64, StoreError> {
        self.store.delete_expired_sessions(batch_size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_shape_has_no_token_or_user() {
        let result: Result<LoginSuccess, LoginError> = Err(LoginError::InvalidCredentials);
        let response = LoginResponse::from(&result);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "error": "Invalid credentials" })
        );
    }

    #[test]
    fn test_success_shape() {
        let now = Utc::now();
        let result: Result<LoginSuccess, LoginError> = Ok(LoginSuccess {
            token: "t".repeat(64),
            issued_at: now,
            expires_at: now + Duration::days(7),
            user: UserView {
                username: "alice".into(),
                role: "member".into(),
            },
        });
        let json = serde_json::to_value(LoginResponse::from(&result)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["token"], "t".repeat(64));
        assert_eq!(
            json["user"],
            serde_json::json!({ "username": "alice", "role": "member" })
        );
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_session_user_uses_camel_case() {
        let user = SessionUser {
            user: "alice".into(),
            role: "member".into(),
            user_id: 7,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "user": "alice", "role": "member", "userId": 7 })
        );
    }
}
