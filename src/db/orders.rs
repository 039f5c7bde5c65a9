//! Order and order-item table operations

use sqlx::SqlitePool;

use crate::model::{Order, OrderItem};

pub struct CreateOrder<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub status: &'a str,
    pub total_amount: i64,
    pub pickup_date: &'a str,
    pub pickup_time: &'a str,
    pub now: i64,
}

pub async fn create(pool: &SqlitePool, order: &CreateOrder<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO orders (id, user_id, status, total_amount, pickup_date, pickup_time, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(order.status)
    .bind(order.total_amount)
    .bind(order.pickup_date)
    .bind(order.pickup_time)
    .bind(order.now)
    .bind(order.now)
    .execute(pool)
    .await?;
    Ok(())
}

pub struct CreateOrderItem<'a> {
    pub id: &'a str,
    pub order_id: &'a str,
    pub inventory_item_id: &'a str,
    pub quantity: i64,
    pub unit_price: i64,
}

pub async fn add_item(pool: &SqlitePool, item: &CreateOrderItem<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO order_items (id, order_id, inventory_item_id, quantity, unit_price)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.inventory_item_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn items(pool: &SqlitePool, order_id: &str) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = ? ORDER BY id")
        .bind(order_id)
        .fetch_all(pool)
        .await
}

/// Guarded status transition: the WHERE clause re-validates the expected
/// current status inside the same statement that writes, so a concurrent
/// writer cannot race past the precondition. Returns false when the guard
/// lost (row missing or status already moved).
pub async fn transition_status(
    pool: &SqlitePool,
    id: &str,
    from: &str,
    to: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(to)
        .bind(now)
        .bind(id)
        .bind(from)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Guarded cancellation; sets the cancellation reason together with the
/// status so the reason-iff-cancelled invariant holds in one write.
pub async fn cancel(
    pool: &SqlitePool,
    id: &str,
    from: &str,
    reason: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = 'cancelled', cancellation_reason = ?, updated_at = ?
         WHERE id = ? AND status = ?",
    )
    .bind(reason)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Orders still awaiting pickup (no-show scan candidates)
pub async fn find_active(pool: &SqlitePool) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM orders WHERE status IN ('confirmed', 'preparing', 'ready') ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
}

/// Destructive undo for orders that never became visible to other
/// subsystems: delete line items, then the order, in one transaction.
/// Returns the number of deleted line items, or None when the order
/// does not exist.
pub async fn delete_with_items(pool: &SqlitePool, id: &str) -> Result<Option<u64>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let items = sqlx::query("DELETE FROM order_items WHERE order_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let order = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if order.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    tx.commit().await?;
    Ok(Some(items.rows_affected()))
}
