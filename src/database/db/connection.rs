use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use crate::config::AppConfig;

pub async fn get_db_pool(config: &AppConfig) -> Result<Pool<Sqlite>, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(config.db_max_connections.max(1))
        .connect(&config.database_url)
        .await
}

/// Single-connection in-memory store; every connection to `:memory:` is a
/// separate database, so the pool must never open a second one.
pub async fn memory_pool() -> Result<Pool<Sqlite>, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}
