//! No-show record operations

use sqlx::SqlitePool;

use crate::model::NoShowRecord;

pub struct CreateNoShow<'a> {
    pub id: &'a str,
    pub order_id: &'a str,
    pub user_id: &'a str,
    pub pickup_date: &'a str,
    pub pickup_time: &'a str,
    pub grace_period_minutes: i64,
    pub detected_at: i64,
}

/// Insert a record in `processing` state before the sequence runs
pub async fn create(pool: &SqlitePool, record: &CreateNoShow<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO no_show_records (id, order_id, user_id, pickup_date, pickup_time, grace_period_minutes, detected_at, status)
         VALUES (?, ?, ?, ?, ?, ?, ?, 'processing')",
    )
    .bind(record.id)
    .bind(record.order_id)
    .bind(record.user_id)
    .bind(record.pickup_date)
    .bind(record.pickup_time)
    .bind(record.grace_period_minutes)
    .bind(record.detected_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Final write: terminal status plus the per-step outcome flags
pub async fn finalize(
    pool: &SqlitePool,
    id: &str,
    status: &str,
    stock_restored: bool,
    notification_sent: bool,
    metadata: Option<&str>,
    completed_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE no_show_records SET status = ?, stock_restored = ?, notification_sent = ?, metadata = ?, completed_at = ?
         WHERE id = ?",
    )
    .bind(status)
    .bind(stock_restored)
    .bind(notification_sent)
    .bind(metadata)
    .bind(completed_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<NoShowRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM no_show_records WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<NoShowRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM no_show_records ORDER BY detected_at DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
}
