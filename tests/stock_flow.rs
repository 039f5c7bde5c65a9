//! Stock reconciler flows: atomic deltas, negative-stock rejection, and
//! the movement journal invariant.

mod common;

use tidepool::db;
use tidepool::error::AppError;
use tidepool::model::MovementType;
use tidepool::services::stock::{apply_movement, restore_order_items, MovementRequest};

use common::{item_stock, now_millis, seed_inventory, seed_order, test_state};

fn movement<'a>(item_id: &'a str, delta: i64, movement_type: MovementType) -> MovementRequest<'a> {
    MovementRequest {
        item_id,
        movement_type,
        quantity_change: delta,
        reason: Some("test"),
        performed_by: None,
        reference_order_id: None,
        batch_id: None,
    }
}

#[tokio::test]
async fn test_apply_movement_journals_invariant() {
    let state = test_state().await;
    seed_inventory(&state, "inv_a", 10).await;

    let sale = apply_movement(&state.pool, &movement("inv_a", -3, MovementType::Sale), now_millis())
        .await
        .expect("sale");
    assert_eq!(sale.previous_stock, 10);
    assert_eq!(sale.new_stock, 7);
    assert_eq!(item_stock(&state, "inv_a").await, 7);

    let restock =
        apply_movement(&state.pool, &movement("inv_a", 5, MovementType::Restock), now_millis())
            .await
            .expect("restock");
    assert_eq!(restock.previous_stock, 7);
    assert_eq!(restock.new_stock, 12);

    let journal = db::inventory::movements_for_item(&state.pool, "inv_a")
        .await
        .expect("journal");
    assert_eq!(journal.len(), 2);
    for entry in &journal {
        assert_eq!(entry.new_stock, entry.previous_stock + entry.quantity_change);
    }
}

#[tokio::test]
async fn test_rejects_negative_stock_and_zero_delta() {
    let state = test_state().await;
    seed_inventory(&state, "inv_b", 2).await;

    let err = apply_movement(&state.pool, &movement("inv_b", -3, MovementType::Sale), now_millis())
        .await
        .expect_err("should reject");
    assert!(matches!(err, AppError::InsufficientStock(_)));
    // Rejection leaves no trace
    assert_eq!(item_stock(&state, "inv_b").await, 2);
    assert!(db::inventory::movements_for_item(&state.pool, "inv_b")
        .await
        .expect("journal")
        .is_empty());

    let err = apply_movement(&state.pool, &movement("inv_b", 0, MovementType::Adjustment), now_millis())
        .await
        .expect_err("should reject");
    assert!(matches!(err, AppError::Validation(_)));

    let err = apply_movement(&state.pool, &movement("inv_ghost", 1, MovementType::Restock), now_millis())
        .await
        .expect_err("should reject");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_batch_restore_continues_past_failures() {
    let state = test_state().await;
    seed_inventory(&state, "inv_c", 0).await;
    seed_order(
        &state,
        "ord_1",
        "usr_1",
        "confirmed",
        "2024-01-01",
        "10:00",
        &[("inv_c", 2), ("inv_ghost", 1), ("inv_c", 3)],
    )
    .await;

    let restorations = restore_order_items(&state.pool, "ord_1", "test", None, now_millis())
        .await
        .expect("restore");
    assert_eq!(restorations.len(), 3);
    assert!(restorations[0].restored);
    assert!(!restorations[1].restored);
    assert!(restorations[2].restored, "failure must not block later items");

    assert_eq!(item_stock(&state, "inv_c").await, 5);

    let journal = db::inventory::movements_for_order(&state.pool, "ord_1")
        .await
        .expect("journal");
    assert_eq!(journal.len(), 2);
}
