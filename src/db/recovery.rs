//! Error recovery record operations

use sqlx::SqlitePool;

use crate::model::ErrorRecoveryRecord;

pub struct CreateRecovery<'a> {
    pub id: &'a str,
    pub error_type: &'a str,
    pub order_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub operation: &'a str,
    pub original_error: &'a str,
    pub strategy: &'a str,
    pub retry_count: i64,
    pub metadata: Option<&'a str>,
    pub now: i64,
}

/// Record the attempt before execution, in `processing` state
pub async fn create(pool: &SqlitePool, record: &CreateRecovery<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO error_recovery_records (id, error_type, order_id, user_id, operation, original_error, strategy, retry_count, metadata, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'processing', ?)",
    )
    .bind(record.id)
    .bind(record.error_type)
    .bind(record.order_id)
    .bind(record.user_id)
    .bind(record.operation)
    .bind(record.original_error)
    .bind(record.strategy)
    .bind(record.retry_count)
    .bind(record.metadata)
    .bind(record.now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Terminal write; a record never stays `processing`. Caller-supplied
/// metadata survives when the strategy produced none of its own.
pub async fn finalize(
    pool: &SqlitePool,
    id: &str,
    status: &str,
    result_message: &str,
    metadata: Option<&str>,
    completed_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE error_recovery_records SET status = ?, result_message = ?, metadata = COALESCE(?, metadata), completed_at = ?
         WHERE id = ?",
    )
    .bind(status)
    .bind(result_message)
    .bind(metadata)
    .bind(completed_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<ErrorRecoveryRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM error_recovery_records WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn recent(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<ErrorRecoveryRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM error_recovery_records ORDER BY created_at DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
}
