//! Inventory and stock-movement table reads
//!
//! The transactional read-modify-write that mutates stock lives in
//! `services::stock`; this module holds the plain reads and seeds.

use sqlx::SqlitePool;

use crate::model::{InventoryItem, StockMovement};

pub async fn create_item(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    stock: i64,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO inventory_items (id, name, stock, updated_at) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(stock)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_item(pool: &SqlitePool, id: &str) -> Result<Option<InventoryItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM inventory_items WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn movements_for_item(
    pool: &SqlitePool,
    inventory_item_id: &str,
) -> Result<Vec<StockMovement>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM stock_movements WHERE inventory_item_id = ? ORDER BY created_at, id",
    )
    .bind(inventory_item_id)
    .fetch_all(pool)
    .await
}

pub async fn movements_for_order(
    pool: &SqlitePool,
    order_id: &str,
) -> Result<Vec<StockMovement>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM stock_movements WHERE reference_order_id = ? ORDER BY created_at, id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
}
