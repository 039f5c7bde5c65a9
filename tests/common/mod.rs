//! Shared fixtures for integration tests

use tidepool::db;
use tidepool::state::AppState;

pub const WEBHOOK_SECRET: &str = "whsec_test";

pub async fn test_state() -> AppState {
    AppState::in_memory(WEBHOOK_SECRET)
        .await
        .expect("in-memory state")
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Seed an order with line items. Inventory rows are seeded separately so
/// tests can model missing items.
pub async fn seed_order(
    state: &AppState,
    order_id: &str,
    user_id: &str,
    status: &str,
    pickup_date: &str,
    pickup_time: &str,
    items: &[(&str, i64)],
) {
    let now = now_millis();
    db::orders::create(
        &state.pool,
        &db::orders::CreateOrder {
            id: order_id,
            user_id,
            status,
            total_amount: items.iter().map(|(_, q)| q * 100).sum(),
            pickup_date,
            pickup_time,
            now,
        },
    )
    .await
    .expect("seed order");

    for (idx, (item_id, quantity)) in items.iter().enumerate() {
        db::orders::add_item(
            &state.pool,
            &db::orders::CreateOrderItem {
                id: &format!("{order_id}_item_{idx}"),
                order_id,
                inventory_item_id: item_id,
                quantity: *quantity,
                unit_price: 100,
            },
        )
        .await
        .expect("seed order item");
    }
}

pub async fn seed_inventory(state: &AppState, item_id: &str, stock: i64) {
    db::inventory::create_item(&state.pool, item_id, item_id, stock, now_millis())
        .await
        .expect("seed inventory");
}

pub async fn order_status(state: &AppState, order_id: &str) -> String {
    db::orders::find_by_id(&state.pool, order_id)
        .await
        .expect("find order")
        .expect("order exists")
        .status
}

pub async fn item_stock(state: &AppState, item_id: &str) -> i64 {
    db::inventory::find_item(&state.pool, item_id)
        .await
        .expect("find item")
        .expect("item exists")
        .stock
}
