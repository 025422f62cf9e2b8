//! Shared startup for the admin binaries

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::config::Config;
use crate::db;

/// `YYYY-MM-DD` argument parser for clap
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

/// Install the `RUST_LOG`-driven subscriber (default `info`), writing to stderr
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load config, connect, and apply migrations when enabled
pub async fn connect() -> Result<PgPool, String> {
    let config = Config::from_env()?;

    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(|e| format!("Failed to connect to database: {}", e))?;
    tracing::info!("Connected to database");

    if config.run_migrations {
        db::run_migrations(&pool)
            .await
            .map_err(|e| format!("Failed to run migrations: {}", e))?;
    }

    Ok(pool)
}
