//! Persistence layer for studio-auth: the shared connection pool, the schema
//! migrator, and the user/session repositories behind [`store::SessionStore`].

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;

pub mod models;
pub mod repositories;
pub mod schema;
pub mod store;

pub type DbPool = sqlx::PgPool;

/// Maximum concurrent connections to the auth store.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
/// How long an idle connection is kept before being closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
/// How long to wait for a connection before giving up.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Pool limits applied when the pool is built.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl PoolSettings {
    fn options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .idle_timeout(self.idle_timeout)
            .acquire_timeout(self.connect_timeout)
            .after_connect(|_conn, _meta| {
                Box::pin(async move {
                    tracing::debug!("Opened auth store connection");
                    Ok(())
                })
            })
    }
}

/// Create a connection pool and connect eagerly.
///
/// Used by short-lived tools (the migrator) that want to fail fast.
pub async fn create_pool(database_url: &str, settings: PoolSettings) -> Result<DbPool, sqlx::Error> {
    settings.options().connect(database_url).await
}

/// Run a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Owns the single shared pool for the auth store.
///
/// Construct one at start-up and share it by `Arc`. The pool is built on the
/// first [`get`](Self::get) call; concurrent first callers wait on the same
/// initialization and every later call returns the same pool. The pool itself
/// connects lazily, so an unreachable database shows up as an error from the
/// first query rather than from `get`.
pub struct ConnectionManager {
    database_url: String,
    settings: PoolSettings,
    pool: OnceCell<DbPool>,
}

impl ConnectionManager {
    pub fn new(database_url: impl Into<String>, settings: PoolSettings) -> Self {
        Self {
            database_url: database_url.into(),
            settings,
            pool: OnceCell::new(),
        }
    }

    /// Wrap a pool that was built elsewhere (tests, tools).
    pub fn from_pool(pool: DbPool) -> Self {
        Self {
            database_url: String::new(),
            settings: PoolSettings::default(),
            pool: OnceCell::new_with(Some(pool)),
        }
    }

    /// Return the shared pool, building it on first use.
    pub async fn get(&self) -> Result<&DbPool, sqlx::Error> {
        self.pool
            .get_or_try_init(|| async {
                let pool = self.settings.options().connect_lazy(&self.database_url)?;
                tracing::info!(
                    max_connections = self.settings.max_connections,
                    idle_timeout_secs = self.settings.idle_timeout.as_secs(),
                    connect_timeout_secs = self.settings.connect_timeout.as_secs(),
                    "Auth store pool initialized"
                );
                Ok::<_, sqlx::Error>(pool)
            })
            .await
    }

    /// Whether the pool has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }

    /// Close the pool if it was ever built. Used on shutdown only.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_settings() {
        let settings = PoolSettings::default();
        assert_eq!(settings.max_connections, 5);
        assert_eq!(settings.idle_timeout, Duration::from_secs(30));
        assert_eq!(settings.connect_timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_pool_is_built_once() {
        // Nothing listens here; the lazy pool must still build without connecting.
        let manager = ConnectionManager::new(
            "postgres://nobody@127.0.0.1:1/none",
            PoolSettings::default(),
        );
        assert!(!manager.is_initialized());

        let first = manager.get().await.expect("lazy pool should build");
        let second = manager.get().await.expect("pool should be reused");
        assert!(manager.is_initialized());
        assert!(std::ptr::eq(first, second), "the same pool must be returned");
    }

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        let manager = ConnectionManager::new("not a url", PoolSettings::default());
        assert!(manager.get().await.is_err());
        assert!(!manager.is_initialized());
    }
}
