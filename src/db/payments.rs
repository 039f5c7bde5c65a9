//! Payment table operations
//!
//! The provider_intent_id UNIQUE constraint keeps at most one row per
//! payment intent; webhook handlers upsert through it.

use sqlx::SqlitePool;

use crate::model::Payment;

pub struct UpsertPayment<'a> {
    pub id: &'a str,
    pub provider_intent_id: &'a str,
    pub user_id: &'a str,
    pub order_id: Option<&'a str>,
    pub amount: i64,
    pub currency: &'a str,
    pub status: &'a str,
    pub payment_method: Option<&'a str>,
    pub metadata: Option<&'a str>,
    pub now: i64,
}

/// Insert a payment, or refresh status/method/metadata on the existing row
/// for the same provider intent.
pub async fn upsert_by_intent(
    pool: &SqlitePool,
    payment: &UpsertPayment<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO payments (id, provider_intent_id, user_id, order_id, amount, currency, status, payment_method, metadata, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (provider_intent_id) DO UPDATE SET
            status = excluded.status,
            payment_method = COALESCE(excluded.payment_method, payment_method),
            metadata = COALESCE(excluded.metadata, metadata),
            order_id = COALESCE(excluded.order_id, order_id),
            updated_at = excluded.updated_at",
    )
    .bind(payment.id)
    .bind(payment.provider_intent_id)
    .bind(payment.user_id)
    .bind(payment.order_id)
    .bind(payment.amount)
    .bind(payment.currency)
    .bind(payment.status)
    .bind(payment.payment_method)
    .bind(payment.metadata)
    .bind(payment.now)
    .bind(payment.now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_intent(
    pool: &SqlitePool,
    provider_intent_id: &str,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE provider_intent_id = ?")
        .bind(provider_intent_id)
        .fetch_optional(pool)
        .await
}

/// Guarded status update; returns false when the expected current status
/// no longer matches.
pub async fn transition_status(
    pool: &SqlitePool,
    provider_intent_id: &str,
    from: &str,
    to: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments SET status = ?, updated_at = ? WHERE provider_intent_id = ? AND status = ?",
    )
    .bind(to)
    .bind(now)
    .bind(provider_intent_id)
    .bind(from)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Attach a payment-method reference to the matching intent, if any.
/// Returns false when no payment row matches.
pub async fn set_payment_method(
    pool: &SqlitePool,
    provider_intent_id: &str,
    payment_method: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments SET payment_method = ?, updated_at = ? WHERE provider_intent_id = ?",
    )
    .bind(payment_method)
    .bind(now)
    .bind(provider_intent_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
