//! Periodic removal of expired sessions.
//!
//! Expired rows are already rejected by validation; this only bounds the size
//! of the `sessions` table. Disabled unless `SESSION_REAPER_INTERVAL_SECS` is
//! set. Each tick deletes in batches of [`BATCH_SIZE`].

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::SessionService;

/// Rows removed per statement.
pub const BATCH_SIZE: i64 = 1000;

/// Upper bound on batches per tick; the rest waits for the next tick.
pub const MAX_BATCHES_PER_TICK: usize = 10;

/// Delete expired sessions until a batch comes back short or the tick budget
/// is spent. Returns the number of rows removed.
pub async fn sweep(sessions: &SessionService) -> u64 {
    let mut total = 0;
    for _ in 0..MAX_BATCHES_PER_TICK {
        match sessions.purge_expired(BATCH_SIZE).await {
            Ok(deleted) => {
                total += deleted;
                if deleted < BATCH_SIZE as u64 {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Session reaper: cleanup failed");
                break;
            }
        }
    }
    total
}

/// Run the reaper loop until `cancel` is triggered.
pub async fn run(sessions: Arc<SessionService>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Session reaper started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session reaper stopping");
                break;
            }
            _ = ticker.tick() => {
                let deleted = sweep(&sessions).await;
                if deleted > 0 {
                    tracing::info!(deleted, "Session reaper: purged expired sessions");
                } else {
                    tracing::debug!("Session reaper: nothing to purge");
                }
            }
        }
    }
}
