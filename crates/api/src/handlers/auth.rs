//! Handlers for the `/auth` resource (login, logout, current session).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::auth::cookie::{removal_cookie, session_cookie, token_from_headers};
use crate::auth::{LoginError, LoginResponse, LogoutResponse};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `POST /auth/login`.
///
/// No `Debug` derive: the password must never reach a log line.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. On success returns the token and
/// user projection and sets the session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    input: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(StatusCode, CookieJar, Json<LoginResponse>)> {
    let Json(input) = input.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let result = state.sessions.login(&input.username, &input.password).await;
    let response = LoginResponse::from(&result);

    Ok(match result {
        Ok(success) => {
            let cookie = session_cookie(&state.config.session, success.token);
            (StatusCode::OK, jar.add(cookie), Json(response))
        }
        Err(LoginError::InvalidCredentials) => (StatusCode::UNAUTHORIZED, jar, Json(response)),
        Err(LoginError::Unavailable) => (StatusCode::SERVICE_UNAVAILABLE, jar, Json(response)),
    })
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented session (if any) and clear the cookie. Logging out an
/// unknown or already revoked session succeeds.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (StatusCode, CookieJar, Json<LogoutResponse>) {
    let session_config = &state.config.session;
    let token = token_from_headers(&headers, &session_config.cookie_name).unwrap_or_default();

    let outcome = state.sessions.logout(&token).await;
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, jar.remove(removal_cookie(session_config)), Json(outcome))
}

/// GET /api/v1/auth/session
///
/// Return the authenticated caller as `{user, role, userId}`.
pub async fn current_session(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}
