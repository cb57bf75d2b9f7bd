//! SQLite connection pool with WAL mode.
//!
//! Provides a thread-safe connection pool for SQLite with Write-Ahead Logging (WAL)
//! so assignment reads are not blocked by a status update in progress.

use crate::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<Sqlite>;

/// Create a new connection pool with WAL mode enabled.
///
/// Pool sizing and the busy timeout come from the `database` section of the
/// application config.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
/// * `config` - Pool sizing and timeouts
///
/// # Returns
/// A connection pool ready for use
pub async fn create_pool(db_path: &Path, config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let db_url = format!("sqlite:{}", db_path.display());

    let connect_options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        // NORMAL synchronous mode balances safety and performance
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        // Writers from other connections wait instead of failing with SQLITE_BUSY
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await?;

    let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await?;

    if mode.0.to_lowercase() != "wal" {
        log::warn!("[db] Journal mode is {}, expected wal", mode.0);
    }

    Ok(pool)
}
