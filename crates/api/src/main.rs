use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_auth_api::auth::SessionService;
use studio_auth_api::background;
use studio_auth_api::config::ServerConfig;
use studio_auth_api::router::build_app_router;
use studio_auth_api::state::AppState;
use studio_auth_core::credential::Argon2Verifier;
use studio_auth_db::store::PgSessionStore;
use studio_auth_db::{ConnectionManager, PoolSettings};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studio_auth_api=debug,studio_auth_db=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    if config.session.trust_identity_headers {
        tracing::warn!(
            "TRUST_IDENTITY_HEADERS is enabled: x-user/x-role are accepted without a session. \
             Only run this behind a boundary that strips them from external requests."
        );
    }

    // --- Auth store (pool is built on first use) ---
    let connections = Arc::new(ConnectionManager::new(
        config.database_url.clone(),
        PoolSettings::default(),
    ));
    let store = Arc::new(PgSessionStore::new(Arc::clone(&connections)));

    // --- Session service ---
    let sessions = Arc::new(
        SessionService::new(store, Arc::new(Argon2Verifier))
            .with_ttl(chrono::Duration::days(config.session.ttl_days)),
    );

    // --- Session reaper (opt-in) ---
    let reaper_cancel = CancellationToken::new();
    let reaper_handle = config.session.reaper_interval_secs.map(|secs| {
        tokio::spawn(background::session_reaper::run(
            Arc::clone(&sessions),
            Duration::from_secs(secs),
            reaper_cancel.clone(),
        ))
    });

    // --- App state ---
    let state = AppState {
        connections: Arc::clone(&connections),
        sessions,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Shutdown ---
    reaper_cancel.cancel();
    if let Some(handle) = reaper_handle {
        let _ = handle.await;
    }
    connections.close().await;
    tracing::info!("Server stopped");
}

/// Resolve when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
