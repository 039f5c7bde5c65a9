//! Webhook ingress flows: signature gate, idempotent deduplication, and
//! type-specific handler effects.

mod common;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use tidepool::api::webhook::handle_webhook;
use tidepool::db;
use tidepool::provider::sign_payload;
use tidepool::state::AppState;

use common::{order_status, seed_order, test_state, WEBHOOK_SECRET};

fn signed_headers(body: &[u8]) -> HeaderMap {
    let header = sign_payload(body, WEBHOOK_SECRET, chrono::Utc::now().timestamp());
    let mut headers = HeaderMap::new();
    headers.insert("x-webhook-signature", header.parse().expect("header value"));
    headers
}

async fn deliver(state: &AppState, body: &str) -> (StatusCode, tidepool::api::webhook::WebhookAck) {
    let headers = signed_headers(body.as_bytes());
    let (status, ack) = handle_webhook(
        State(state.clone()),
        headers,
        Bytes::from(body.to_string()),
    )
    .await;
    (status, ack.0)
}

fn succeeded_event(event_id: &str, intent: &str, order_id: &str) -> String {
    format!(
        r#"{{
            "id": "{event_id}",
            "type": "payment_intent.succeeded",
            "created": 1700000000,
            "data": {{"object": {{
                "id": "{intent}",
                "amount": 2500,
                "currency": "eur",
                "payment_method": "pm_1",
                "metadata": {{"order_id": "{order_id}", "user_id": "usr_1", "customer_name": "Ada"}}
            }}}}
        }}"#
    )
}

#[tokio::test]
async fn test_missing_signature_rejected_without_trace() {
    let state = test_state().await;
    let body = succeeded_event("evt_1", "pi_1", "ord_1");

    let (status, ack) = handle_webhook(
        State(state.clone()),
        HeaderMap::new(),
        Bytes::from(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!ack.0.received);

    // Rejection happens before the event is parsed: no log row
    let count = db::webhook_events::count(&state.pool).await.expect("count");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_invalid_signature_rejected() {
    let state = test_state().await;
    let body = succeeded_event("evt_2", "pi_2", "ord_2");

    let mut headers = HeaderMap::new();
    let forged = sign_payload(body.as_bytes(), "whsec_wrong", chrono::Utc::now().timestamp());
    headers.insert("x-webhook-signature", forged.parse().expect("header value"));

    let (status, _) = handle_webhook(State(state.clone()), headers, Bytes::from(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(db::webhook_events::count(&state.pool).await.expect("count"), 0);
}

#[tokio::test]
async fn test_succeeded_event_settles_payment_and_confirms_order() {
    let state = test_state().await;
    seed_order(&state, "ord_1", "usr_1", "pending", "2024-01-01", "10:00", &[]).await;

    let (status, ack) = deliver(&state, &succeeded_event("evt_3", "pi_3", "ord_1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.received);
    assert!(ack.processed);
    assert_eq!(ack.event_id.as_deref(), Some("evt_3"));

    let payment = db::payments::find_by_intent(&state.pool, "pi_3")
        .await
        .expect("find")
        .expect("payment exists");
    assert_eq!(payment.status, "succeeded");
    assert_eq!(payment.order_id.as_deref(), Some("ord_1"));
    assert_eq!(payment.amount, 2500);

    assert_eq!(order_status(&state, "ord_1").await, "confirmed");

    let notifications = db::notifications::for_order(&state.pool, "ord_1")
        .await
        .expect("notifications");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, "order_confirmation");

    let row = db::webhook_events::find(&state.pool, "evt_3")
        .await
        .expect("find event")
        .expect("event row");
    assert!(row.success);
    assert!(row.payload.contains("pi_3"));
}

#[tokio::test]
async fn test_duplicate_delivery_is_idempotent() {
    let state = test_state().await;
    seed_order(&state, "ord_1", "usr_1", "pending", "2024-01-01", "10:00", &[]).await;
    let body = succeeded_event("evt_dup", "pi_4", "ord_1");

    // Concurrent deliveries of the same event id
    let (first, second) = tokio::join!(deliver(&state, &body), deliver(&state, &body));
    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);

    // Exactly one of the two actually processed
    assert!(first.1.processed != second.1.processed);

    // Exactly one event row, one notification
    assert_eq!(db::webhook_events::count(&state.pool).await.expect("count"), 1);
    let notifications = db::notifications::for_order(&state.pool, "ord_1")
        .await
        .expect("notifications");
    assert_eq!(notifications.len(), 1);

    // Replaying later is still a no-op
    let (status, ack) = deliver(&state, &body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.received);
    assert!(!ack.processed);
    assert_eq!(db::webhook_events::count(&state.pool).await.expect("count"), 1);
}

#[tokio::test]
async fn test_payment_failed_records_and_notifies() {
    let state = test_state().await;
    seed_order(&state, "ord_5", "usr_5", "pending", "2024-01-01", "10:00", &[]).await;

    let body = format!(
        r#"{{
            "id": "evt_5",
            "type": "payment_intent.payment_failed",
            "data": {{"object": {{
                "id": "pi_5",
                "amount": 900,
                "currency": "eur",
                "metadata": {{"order_id": "ord_5", "user_id": "usr_5"}},
                "last_payment_error": {{"message": "card_declined"}}
            }}}}
        }}"#
    );
    let (status, ack) = deliver(&state, &body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.processed);

    let payment = db::payments::find_by_intent(&state.pool, "pi_5")
        .await
        .expect("find")
        .expect("payment exists");
    assert_eq!(payment.status, "failed");
    assert!(payment.metadata.as_deref().expect("metadata").contains("card_declined"));

    // Order stays pending; customer is told the payment bounced
    assert_eq!(order_status(&state, "ord_5").await, "pending");
    let notifications = db::notifications::for_order(&state.pool, "ord_5")
        .await
        .expect("notifications");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, "payment_failed");
}

#[tokio::test]
async fn test_dispute_transitions_succeeded_payment() {
    let state = test_state().await;
    seed_order(&state, "ord_6", "usr_6", "pending", "2024-01-01", "10:00", &[]).await;
    let (_, ack) = deliver(&state, &succeeded_event("evt_6a", "pi_6", "ord_6")).await;
    assert!(ack.processed);

    let body = r#"{
        "id": "evt_6b",
        "type": "charge.dispute.created",
        "data": {"object": {"id": "dp_1", "payment_intent": "pi_6"}}
    }"#;
    let (status, ack) = deliver(&state, body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.processed);

    let payment = db::payments::find_by_intent(&state.pool, "pi_6")
        .await
        .expect("find")
        .expect("payment exists");
    assert_eq!(payment.status, "disputed");
}

#[tokio::test]
async fn test_out_of_order_event_is_recorded_as_handler_failure() {
    let state = test_state().await;

    // Cancel first...
    let cancel = r#"{
        "id": "evt_7a",
        "type": "payment_intent.canceled",
        "data": {"object": {"id": "pi_7", "metadata": {"user_id": "usr_7"}}}
    }"#;
    let (_, ack) = deliver(&state, cancel).await;
    assert!(ack.processed);

    // ...then a stale success arrives: illegal transition, logged not applied
    let stale = r#"{
        "id": "evt_7b",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": "pi_7", "metadata": {"user_id": "usr_7"}}}
    }"#;
    let (status, ack) = deliver(&state, stale).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!ack.processed);

    let payment = db::payments::find_by_intent(&state.pool, "pi_7")
        .await
        .expect("find")
        .expect("payment exists");
    assert_eq!(payment.status, "canceled");

    let row = db::webhook_events::find(&state.pool, "evt_7b")
        .await
        .expect("find event")
        .expect("event row");
    assert!(!row.success);
    assert!(row.error_message.as_deref().expect("error").contains("canceled"));
}

#[tokio::test]
async fn test_unrecognized_event_acknowledged_without_action() {
    let state = test_state().await;
    let body = r#"{
        "id": "evt_8",
        "type": "customer.created",
        "data": {"object": {"id": "cus_1"}}
    }"#;
    let (status, ack) = deliver(&state, body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.received);
    assert!(!ack.processed);

    // Logged for replay/debugging, marked handled
    let row = db::webhook_events::find(&state.pool, "evt_8")
        .await
        .expect("find event")
        .expect("event row");
    assert!(row.success);
}

#[tokio::test]
async fn test_method_attached_updates_matching_payment() {
    let state = test_state().await;
    let create = r#"{
        "id": "evt_9a",
        "type": "payment_intent.processing",
        "data": {"object": {"id": "pi_9", "amount": 100, "metadata": {"user_id": "usr_9"}}}
    }"#;
    let (_, ack) = deliver(&state, create).await;
    assert!(ack.processed);

    let attach = r#"{
        "id": "evt_9b",
        "type": "payment_method.attached",
        "data": {"object": {"id": "pm_9", "payment_intent": "pi_9"}}
    }"#;
    let (_, ack) = deliver(&state, attach).await;
    assert!(ack.processed);

    let payment = db::payments::find_by_intent(&state.pool, "pi_9")
        .await
        .expect("find")
        .expect("payment exists");
    assert_eq!(payment.payment_method.as_deref(), Some("pm_9"));
}
