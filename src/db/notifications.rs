//! Notification record operations

use sqlx::SqlitePool;

use crate::model::NotificationRecord;

pub struct CreateNotification<'a> {
    pub id: &'a str,
    pub notification_type: &'a str,
    pub user_id: &'a str,
    pub order_id: Option<&'a str>,
    pub recipient_name: Option<&'a str>,
    pub recipient_email: Option<&'a str>,
    pub recipient_phone: Option<&'a str>,
    pub message_title: &'a str,
    pub message_body: &'a str,
    pub delivery_method: &'a str,
    pub now: i64,
}

/// Persist the record in `pending` state before attempting delivery
pub async fn create(
    pool: &SqlitePool,
    notification: &CreateNotification<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO notification_records (id, notification_type, user_id, order_id, recipient_name, recipient_email, recipient_phone, message_title, message_body, delivery_method, status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)",
    )
    .bind(notification.id)
    .bind(notification.notification_type)
    .bind(notification.user_id)
    .bind(notification.order_id)
    .bind(notification.recipient_name)
    .bind(notification.recipient_email)
    .bind(notification.recipient_phone)
    .bind(notification.message_title)
    .bind(notification.message_body)
    .bind(notification.delivery_method)
    .bind(notification.now)
    .bind(notification.now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_sent(pool: &SqlitePool, id: &str, now: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE notification_records SET status = 'sent', updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_failed(
    pool: &SqlitePool,
    id: &str,
    error_message: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE notification_records SET status = 'failed', error_message = ?, retry_count = retry_count + 1, updated_at = ?
         WHERE id = ?",
    )
    .bind(error_message)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<NotificationRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notification_records WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn for_order(
    pool: &SqlitePool,
    order_id: &str,
) -> Result<Vec<NotificationRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notification_records WHERE order_id = ? ORDER BY created_at, id")
        .bind(order_id)
        .fetch_all(pool)
        .await
}
