//! Webhook event log operations
//!
//! The event_id PRIMARY KEY is the system's sole deduplication mechanism:
//! INSERT first, check rows_affected (eliminates the TOCTOU race).

use sqlx::SqlitePool;

use crate::model::WebhookEventRow;

/// Attempt to claim an event id. Returns true when this delivery is the
/// first one; false means a duplicate that must be acknowledged without
/// re-running handlers.
pub async fn insert_new(
    pool: &SqlitePool,
    event_id: &str,
    event_type: &str,
    payload: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO webhook_events (event_id, event_type, processed_at, success, payload)
         VALUES (?, ?, ?, 0, ?) ON CONFLICT DO NOTHING",
    )
    .bind(event_id)
    .bind(event_type)
    .bind(now)
    .bind(payload)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Write the dispatch outcome back onto the claimed event row
pub async fn record_outcome(
    pool: &SqlitePool,
    event_id: &str,
    success: bool,
    error_message: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE webhook_events SET success = ?, error_message = ?, processed_at = ? WHERE event_id = ?",
    )
    .bind(success)
    .bind(error_message)
    .bind(now)
    .bind(event_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(pool: &SqlitePool, event_id: &str) -> Result<Option<WebhookEventRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM webhook_events WHERE event_id = ?")
        .bind(event_id)
        .fetch_optional(pool)
        .await
}

pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<WebhookEventRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM webhook_events ORDER BY processed_at DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webhook_events")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
