//! Error recovery coordinator flows: strategy determinism, compensation,
//! rollback, and classify-only paths.

mod common;

use tidepool::db;
use tidepool::services::recovery::{execute_recovery, RecoveryRequest};

use common::{item_stock, now_millis, order_status, seed_inventory, seed_order, test_state};

fn request<'a>(error_type: &'a str, order_id: Option<&'a str>) -> RecoveryRequest<'a> {
    RecoveryRequest {
        error_type,
        order_id,
        user_id: Some("usr_1"),
        operation: "test_operation",
        original_error: "boom",
        retry_count: 1,
        metadata: None,
    }
}

#[tokio::test]
async fn test_retryable_errors_classify_without_mutation() {
    let state = test_state().await;
    seed_order(&state, "ord_1", "usr_1", "confirmed", "2024-01-01", "10:00", &[]).await;

    for error_type in ["payment_failed", "notification_failed", "database_error", "network_error"] {
        let outcome = execute_recovery(&state.pool, &request(error_type, Some("ord_1")), now_millis())
            .await
            .expect("recovery");
        assert!(outcome.success);
        assert_eq!(outcome.action, "retry");
        assert!(!outcome.recovered);
        assert!(!outcome.compensation_applied);

        let record = db::recovery::find_by_id(&state.pool, &outcome.recovery_id)
            .await
            .expect("find")
            .expect("record exists");
        assert_eq!(record.status, "completed");
        assert_eq!(record.strategy, "retry");
    }

    // Classification only: the order was never touched
    assert_eq!(order_status(&state, "ord_1").await, "confirmed");
}

#[tokio::test]
async fn test_unknown_error_routes_to_manual_intervention() {
    let state = test_state().await;

    let outcome = execute_recovery(&state.pool, &request("unknown_x", None), now_millis())
        .await
        .expect("recovery");
    assert!(outcome.success);
    assert_eq!(outcome.action, "manual_intervention");
    assert!(!outcome.recovered);

    let record = db::recovery::find_by_id(&state.pool, &outcome.recovery_id)
        .await
        .expect("find")
        .expect("record exists");
    assert_eq!(record.status, "completed");
    assert_eq!(record.error_type, "unknown_x");
    assert_eq!(record.strategy, "manual_intervention");
}

#[tokio::test]
async fn test_compensate_restores_stock_and_cancels() {
    let state = test_state().await;
    seed_inventory(&state, "inv_a", 1).await;
    seed_order(
        &state,
        "ord_2",
        "usr_2",
        "preparing",
        "2024-01-01",
        "10:00",
        &[("inv_a", 4)],
    )
    .await;

    let outcome = execute_recovery(
        &state.pool,
        &request("stock_update_failed", Some("ord_2")),
        now_millis(),
    )
    .await
    .expect("recovery");

    assert!(outcome.success);
    assert_eq!(outcome.action, "compensate");
    assert!(outcome.recovered);
    assert!(outcome.compensation_applied);

    assert_eq!(order_status(&state, "ord_2").await, "cancelled");
    let order = db::orders::find_by_id(&state.pool, "ord_2")
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(order.cancellation_reason.as_deref(), Some("automatic_recovery"));
    assert_eq!(item_stock(&state, "inv_a").await, 5);

    let record = db::recovery::find_by_id(&state.pool, &outcome.recovery_id)
        .await
        .expect("find")
        .expect("record exists");
    assert_eq!(record.status, "completed");
    assert!(record.metadata.as_deref().expect("metadata").contains("inv_a"));
}

#[tokio::test]
async fn test_compensate_without_order_context_fails_cleanly() {
    let state = test_state().await;

    let outcome = execute_recovery(&state.pool, &request("stock_update_failed", None), now_millis())
        .await
        .expect("recovery");
    assert!(!outcome.success);
    assert!(!outcome.compensation_applied);
    assert!(outcome.message.contains("order context"));

    let record = db::recovery::find_by_id(&state.pool, &outcome.recovery_id)
        .await
        .expect("find")
        .expect("record exists");
    assert_eq!(record.status, "failed");
}

#[tokio::test]
async fn test_compensate_missing_order_fails_cleanly() {
    let state = test_state().await;

    let outcome = execute_recovery(
        &state.pool,
        &request("stock_update_failed", Some("ord_ghost")),
        now_millis(),
    )
    .await
    .expect("recovery");
    assert!(!outcome.success);

    let record = db::recovery::find_by_id(&state.pool, &outcome.recovery_id)
        .await
        .expect("find")
        .expect("record exists");
    assert_eq!(record.status, "failed");
}

#[tokio::test]
async fn test_rollback_deletes_order_and_items() {
    let state = test_state().await;
    seed_order(
        &state,
        "ord_3",
        "usr_3",
        "pending",
        "2024-01-01",
        "10:00",
        &[("inv_x", 1), ("inv_y", 2)],
    )
    .await;

    let outcome = execute_recovery(
        &state.pool,
        &request("order_creation_failed", Some("ord_3")),
        now_millis(),
    )
    .await
    .expect("recovery");

    assert!(outcome.success);
    assert_eq!(outcome.action, "rollback");
    assert!(outcome.recovered);
    assert!(!outcome.compensation_applied);

    assert!(db::orders::find_by_id(&state.pool, "ord_3")
        .await
        .expect("find")
        .is_none());
    assert!(db::orders::items(&state.pool, "ord_3")
        .await
        .expect("items")
        .is_empty());

    let record = db::recovery::find_by_id(&state.pool, &outcome.recovery_id)
        .await
        .expect("find")
        .expect("record exists");
    assert_eq!(record.status, "completed");
    assert!(record.metadata.as_deref().expect("metadata").contains("2"));
}

#[tokio::test]
async fn test_no_record_is_left_processing() {
    let state = test_state().await;
    seed_order(&state, "ord_4", "usr_4", "ready", "2024-01-01", "10:00", &[]).await;

    for (error_type, order) in [
        ("payment_failed", None),
        ("stock_update_failed", Some("ord_4")),
        ("order_creation_failed", Some("ord_missing")),
        ("something_else", None),
    ] {
        let outcome = execute_recovery(&state.pool, &request(error_type, order), now_millis())
            .await
            .expect("recovery");
        let record = db::recovery::find_by_id(&state.pool, &outcome.recovery_id)
            .await
            .expect("find")
            .expect("record exists");
        assert_ne!(record.status, "processing", "strategy {error_type} left a dangling record");
        assert!(record.completed_at.is_some());
    }
}
