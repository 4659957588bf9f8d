//! Session-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::Serialize;
use studio_auth_core::error::CoreError;
use studio_auth_core::types::DbId;

use crate::auth::cookie::token_from_headers;
use crate::error::AppError;
use crate::state::AppState;

/// Header naming the caller when identity headers are trusted.
pub const USER_HEADER: &str = "x-user";
/// Header carrying the caller's role when identity headers are trusted.
pub const ROLE_HEADER: &str = "x-role";

/// Where an [`AuthUser`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// `x-user` / `x-role` set by an internal caller. No store lookup.
    TrustedHeaders,
    /// A valid session token.
    Session,
}

/// Authenticated caller.
///
/// Use this as an extractor parameter in any handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user = %user.user, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub user: String,
    pub role: String,
    /// `None` for identities asserted by trusted headers.
    pub user_id: Option<DbId>,
    #[serde(skip)]
    pub source: IdentitySource,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_config = &state.config.session;

        if session_config.trust_identity_headers {
            if let Some(user) = trusted_identity(&parts.headers) {
                return Ok(user);
            }
        }

        let token = token_from_headers(&parts.headers, &session_config.cookie_name)
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Missing session".into())))?;

        let session = state.sessions.validate(&token).await.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired session".into()))
        })?;

        Ok(AuthUser {
            user: session.user,
            role: session.role,
            user_id: Some(session.user_id),
            source: IdentitySource::Session,
        })
    }
}

/// Read `x-user` / `x-role`. Both must be present and non-empty.
fn trusted_identity(headers: &HeaderMap) -> Option<AuthUser> {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Some(AuthUser {
        user: read(USER_HEADER)?,
        role: read(ROLE_HEADER)?,
        user_id: None,
        source: IdentitySource::TrustedHeaders,
    })
}
