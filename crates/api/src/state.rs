use std::sync::Arc;

use studio_auth_db::ConnectionManager;

use crate::auth::SessionService;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The auth store pool, built on first use.
    pub connections: Arc<ConnectionManager>,
    /// Login / validate / logout.
    pub sessions: Arc<SessionService>,
    /// Server configuration (accessed by the extractor and handlers).
    pub config: Arc<ServerConfig>,
}
