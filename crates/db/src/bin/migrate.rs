//! `studio-auth-migrate`: provision the auth tables, then exit.
//!
//! Safe to run on every deploy. Exits 0 when the schema is up to date and 1 on
//! any configuration or statement failure.

use std::process::ExitCode;

use anyhow::Context;
use sqlx::PgPool;
use studio_auth_core::config::{env_lookup, resolve_migration_database_url};
use studio_auth_db::PoolSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studio_auth_db=info,studio_auth_migrate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    report(run(env_lookup).await)
}

/// Map the outcome of a run to the process exit code, logging failures.
fn report(result: anyhow::Result<usize>) -> ExitCode {
    match result {
        Ok(steps) => {
            tracing::info!(steps, "Migration finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Migration failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<usize> {
    let database_url = resolve_migration_database_url(lookup)?;

    // A dedicated single-connection pool, closed before exit.
    let settings = PoolSettings {
        max_connections: 1,
        ..PoolSettings::default()
    };
    let pool = studio_auth_db::create_pool(&database_url, settings)
        .await
        .context("failed to connect to the database")?;
    tracing::info!("Connected to database");

    apply(pool).await
}

/// Run the schema steps, then close `pool` whatever the outcome.
async fn apply(pool: PgPool) -> anyhow::Result<usize> {
    let result = studio_auth_db::schema::ensure_schema(&pool).await;
    pool.close().await;
    Ok(result?)
}
