#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use studio_auth_api::auth::SessionService;
use studio_auth_api::config::{ServerConfig, SessionConfig};
use studio_auth_api::router::build_app_router;
use studio_auth_api::state::AppState;
use studio_auth_core::credential::{hash_password, Argon2Verifier};
use studio_auth_core::types::DbId;
use studio_auth_db::models::session::{ActiveSession, CreateSession};
use studio_auth_db::models::user::User;
use studio_auth_db::store::{PgSessionStore, SessionStore, StoreError};
use studio_auth_db::ConnectionManager;

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: String::new(),
        session: SessionConfig::default(),
    }
}

/// Build the full application router over `pool`, using the same middleware
/// stack as production.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_config(pool, test_config())
}

pub fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let connections = Arc::new(ConnectionManager::from_pool(pool));
    let store = Arc::new(PgSessionStore::new(Arc::clone(&connections)));
    let sessions = Arc::new(SessionService::new(store, Arc::new(Argon2Verifier)));

    let state = AppState {
        connections,
        sessions,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response {
    get_with_headers(app, uri, &[]).await
}

pub async fn get_with_headers(app: Router, uri: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_with_headers(app: Router, uri: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// The `name=value` pair of the first `Set-Cookie` header, if any.
pub fn set_cookie_pair(response: &Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
}

// ---------------------------------------------------------------------------
// Store fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    sessions: HashMap<String, CreateSession>,
}

/// In-process `SessionStore` with the same semantics as the Postgres one.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    calls: AtomicUsize,
}

impl InMemoryStore {
    /// Add a user whose stored credential is the Argon2 hash of `password`.
    pub fn add_user(&self, username: &str, password: Option<&str>, role: &str) -> User {
        let mut inner = self.inner.lock().unwrap();
        let user = User {
            id: inner.users.len() as DbId + 1,
            username: username.to_string(),
            password_hash: password.map(|p| hash_password(p).expect("hashing should succeed")),
            role: role.to_string(),
        };
        inner.users.push(user.clone());
        user
    }

    /// Insert a session row directly, bypassing login.
    pub fn insert_session(&self, session: CreateSession) {
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.insert(session.token.clone(), session);
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    pub fn session(&self, token: &str) -> Option<CreateSession> {
        self.inner.lock().unwrap().sessions.get(token).cloned()
    }

    /// Number of store operations performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.record_call();
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_session(&self, input: &CreateSession) -> Result<(), StoreError> {
        self.record_call();
        let mut inner = self.inner.lock().unwrap();
        if inner.sessions.contains_key(&input.token) {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "duplicate session token".into(),
            )));
        }
        inner.sessions.insert(input.token.clone(), input.clone());
        Ok(())
    }

    async fn find_active_session_with_user(
        &self,
        token: &str,
    ) -> Result<Option<ActiveSession>, StoreError> {
        self.record_call();
        let inner = self.inner.lock().unwrap();
        let now = Utc::now();
        Ok(inner
            .sessions
            .get(token)
            .filter(|s| s.expires_at > now)
            .and_then(|s| {
                inner
                    .users
                    .iter()
                    .find(|u| u.id == s.user_id)
                    .map(|u| ActiveSession {
                        token: s.token.clone(),
                        user_id: u.id,
                        expires_at: s.expires_at,
                        username: u.username.clone(),
                        role: u.role.clone(),
                    })
            }))
    }

    async fn delete_session(&self, token: &str) -> Result<bool, StoreError> {
        self.record_call();
        Ok(self.inner.lock().unwrap().sessions.remove(token).is_some())
    }

    async fn delete_expired_sessions(&self, batch_size: i64) -> Result<u64, StoreError> {
        self.record_call();
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let expired: Vec<String> = inner
            .sessions
            .values()
            .filter(|s| s.expires_at <= now)
            .take(batch_size as usize)
            .map(|s| s.token.clone())
            .collect();
        for token in &expired {
            inner.sessions.remove(token);
        }
        Ok(expired.len() as u64)
    }
}

/// A store whose every operation fails as if the database were unreachable.
pub struct FailingStore;

fn unreachable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn find_user_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
        Err(unreachable())
    }

    async fn create_session(&self, _input: &CreateSession) -> Result<(), StoreError> {
        Err(unreachable())
    }

    async fn find_active_session_with_user(
        &self,
        _token: &str,
    ) -> Result<Option<ActiveSession>, StoreError> {
        Err(unreachable())
    }

    async fn delete_session(&self, _token: &str) -> Result<bool, StoreError> {
        Err(unreachable())
    }

    async fn delete_expired_sessions(&self, _batch_size: i64) -> Result<u64, StoreError> {
        Err(unreachable())
    }
}

/// Service over an in-memory store with Argon2 verification.
pub fn in_memory_service() -> (Arc<InMemoryStore>, SessionService) {
    let store = Arc::new(InMemoryStore::default());
    let service = SessionService::new(store.clone(), Arc::new(Argon2Verifier));
    (store, service)
}
