//! Ledger store access layer
//!
//! One module per table; runtime-bound queries in the shape the rest of the
//! service expects. Every mutating statement is either a single guarded
//! UPDATE or runs inside a short transaction owned by the caller.

pub mod inventory;
pub mod no_show;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod recovery;
pub mod webhook_events;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Connect to the ledger database and run migrations
pub async fn connect(database_url: &str) -> Result<SqlitePool, BoxError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// In-memory ledger for tests and dev mode
///
/// A single connection so the `:memory:` database is shared by every
/// acquire; min = max keeps the idle reaper from dropping it.
pub async fn connect_memory() -> Result<SqlitePool, BoxError> {
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
