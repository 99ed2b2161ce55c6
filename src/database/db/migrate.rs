use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::{Pool, Sqlite};
use tracing::debug;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Brings the transparency schema up to date; safe on every start.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    MIGRATOR.run(pool).await.context("applying schema migrations")?;
    debug!(migrations = MIGRATOR.iter().count(), "schema up to date");
    Ok(())
}
