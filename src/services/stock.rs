//! Stock reconciler
//!
//! Applies signed quantity deltas to inventory atomically and appends a
//! movement journal row per change. Batch restoration collects per-item
//! outcomes; one item's failure never blocks the rest.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::model::{ItemRestoration, MovementType, StockMovement};

pub struct MovementRequest<'a> {
    pub item_id: &'a str,
    pub movement_type: MovementType,
    pub quantity_change: i64,
    pub reason: Option<&'a str>,
    pub performed_by: Option<&'a str>,
    pub reference_order_id: Option<&'a str>,
    pub batch_id: Option<&'a str>,
}

/// Atomically apply a signed delta to an item's stock and journal it.
///
/// Inside one transaction: read current stock, compute
/// `new = current + delta`, reject negatives, write the new stock guarded
/// by the previous value, append the movement row. A lost guard means a
/// concurrent writer got there first and surfaces as a conflict.
pub async fn apply_movement(
    pool: &SqlitePool,
    request: &MovementRequest<'_>,
    now: i64,
) -> AppResult<StockMovement> {
    if request.quantity_change == 0 {
        return Err(AppError::Validation("quantity_change must be non-zero".into()));
    }

    let mut tx = pool.begin().await?;

    let row: Option<(i64,)> = sqlx::query_as("SELECT stock FROM inventory_items WHERE id = ?")
        .bind(request.item_id)
        .fetch_optional(&mut *tx)
        .await?;

    let previous_stock = match row {
        Some((stock,)) => stock,
        None => {
            return Err(AppError::NotFound(format!(
                "inventory item {}",
                request.item_id
            )));
        }
    };

    let new_stock = previous_stock + request.quantity_change;
    if new_stock < 0 {
        return Err(AppError::InsufficientStock(format!(
            "item {}: stock {} cannot absorb delta {}",
            request.item_id, previous_stock, request.quantity_change
        )));
    }

    let updated = sqlx::query(
        "UPDATE inventory_items SET stock = ?, updated_at = ? WHERE id = ? AND stock = ?",
    )
    .bind(new_stock)
    .bind(now)
    .bind(request.item_id)
    .bind(previous_stock)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::Conflict(format!(
            "concurrent stock update on item {}",
            request.item_id
        )));
    }

    let movement_id = format!("mov_{}", Uuid::new_v4());
    sqlx::query(
        "INSERT INTO stock_movements (id, inventory_item_id, movement_type, quantity_change, previous_stock, new_stock, reason, performed_by, reference_order_id, batch_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&movement_id)
    .bind(request.item_id)
    .bind(request.movement_type.as_str())
    .bind(request.quantity_change)
    .bind(previous_stock)
    .bind(new_stock)
    .bind(request.reason)
    .bind(request.performed_by)
    .bind(request.reference_order_id)
    .bind(request.batch_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(StockMovement {
        id: movement_id,
        inventory_item_id: request.item_id.to_string(),
        movement_type: request.movement_type.as_str().to_string(),
        quantity_change: request.quantity_change,
        previous_stock,
        new_stock,
        reason: request.reason.map(String::from),
        performed_by: request.performed_by.map(String::from),
        reference_order_id: request.reference_order_id.map(String::from),
        batch_id: request.batch_id.map(String::from),
        created_at: now,
    })
}

/// Reverse the reservations of every line item on an order, one release
/// movement per item. Per-item failures are captured in the returned
/// breakdown and do not abort the pass.
pub async fn restore_order_items(
    pool: &SqlitePool,
    order_id: &str,
    reason: &str,
    performed_by: Option<&str>,
    now: i64,
) -> AppResult<Vec<ItemRestoration>> {
    let items = db::orders::items(pool, order_id).await?;
    let mut restorations = Vec::with_capacity(items.len());

    for item in &items {
        let request = MovementRequest {
            item_id: &item.inventory_item_id,
            movement_type: MovementType::Release,
            quantity_change: item.quantity,
            reason: Some(reason),
            performed_by,
            reference_order_id: Some(order_id),
            batch_id: None,
        };
        match apply_movement(pool, &request, now).await {
            Ok(movement) => restorations.push(ItemRestoration {
                inventory_item_id: item.inventory_item_id.clone(),
                quantity: item.quantity,
                restored: true,
                movement_id: Some(movement.id),
                error: None,
            }),
            Err(e) => {
                tracing::warn!(
                    order_id = order_id,
                    item_id = %item.inventory_item_id,
                    error = %e,
                    "Stock restoration failed for item"
                );
                restorations.push(ItemRestoration {
                    inventory_item_id: item.inventory_item_id.clone(),
                    quantity: item.quantity,
                    restored: false,
                    movement_id: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(restorations)
}
