//! Payment-provider webhook handler
//!
//! POST /webhooks/payments — raw body for signature verification.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::{AppError, AppResult};
use crate::model::{
    DeliveryMethod, NotificationType, OrderStatus, PaymentMetadata, PaymentStatus, TransitionCause,
    WebhookEventRow,
};
use crate::provider::{self, Event};
use crate::services::{notifier::SendNotification, orders};
use crate::state::AppState;

/// Acknowledgement body returned to the provider
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    pub processed: bool,
    pub timestamp: i64,
}

impl WebhookAck {
    fn rejected(now: i64) -> Self {
        Self {
            received: false,
            event_id: None,
            event_type: None,
            processed: false,
            timestamp: now,
        }
    }
}

/// Handle incoming provider webhook events
///
/// Must receive the raw body (not JSON) for HMAC signature verification;
/// the signature is checked before the event is parsed into anything
/// recognizable, so forged requests leave no trace.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookAck>) {
    let now = chrono::Utc::now().timestamp_millis();

    // 1. Signature header, then signature, before anything else
    let sig_header = match headers
        .get("x-webhook-signature")
        .and_then(|v| v.to_str().ok())
    {
        Some(s) => s,
        None => {
            tracing::warn!("Missing webhook signature header");
            return (StatusCode::BAD_REQUEST, Json(WebhookAck::rejected(now)));
        }
    };

    if let Err(e) = provider::verify_signature(&body, sig_header, &state.webhook_secret) {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return (StatusCode::BAD_REQUEST, Json(WebhookAck::rejected(now)));
    }

    // 2. Parse the event envelope
    let event = match Event::parse(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return (StatusCode::BAD_REQUEST, Json(WebhookAck::rejected(now)));
        }
    };
    tracing::info!(event_id = %event.id, event_type = %event.event_type, "Received webhook");

    // 3. Idempotency: INSERT first, check rows_affected (eliminates the
    //    TOCTOU race). A duplicate is acknowledged without re-running
    //    handlers.
    let payload = String::from_utf8_lossy(&body);
    let claimed =
        match db::webhook_events::insert_new(&state.pool, &event.id, &event.event_type, &payload, now)
            .await
        {
            Ok(claimed) => claimed,
            Err(e) => {
                tracing::error!(%e, "DB error recording webhook event");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(WebhookAck::rejected(now)),
                );
            }
        };

    if !claimed {
        tracing::info!(event_id = %event.id, "Duplicate webhook event, skipping");
        return (
            StatusCode::OK,
            Json(WebhookAck {
                received: true,
                event_id: Some(event.id),
                event_type: Some(event.event_type),
                processed: false,
                timestamp: now,
            }),
        );
    }

    // 4. Dispatch by event type
    let (handled, result) = dispatch(&state, &event, now).await;

    // 5. Write the outcome back onto the event row, payload retained
    let (success, error_message) = match &result {
        Ok(()) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };
    if let Err(e) = db::webhook_events::record_outcome(
        &state.pool,
        &event.id,
        success,
        error_message.as_deref(),
        now,
    )
    .await
    {
        tracing::error!(%e, "Failed to record webhook outcome");
    }

    if let Err(e) = &result {
        // Validation-class failures (e.g. out-of-order events) are expected
        // negatives; only infrastructure failures are errors
        if e.is_validation() {
            tracing::warn!(event_id = %event.id, error = %e, "Webhook handler rejected event");
        } else {
            tracing::error!(event_id = %event.id, error = %e, "Webhook handler failed");
        }
    }

    (
        StatusCode::OK,
        Json(WebhookAck {
            received: true,
            event_id: Some(event.id),
            event_type: Some(event.event_type),
            processed: handled && success,
            timestamp: now,
        }),
    )
}

/// Route the event to its type-specific handler. Returns whether the type
/// was recognized, plus the handler outcome.
async fn dispatch(state: &AppState, event: &Event, now: i64) -> (bool, AppResult<()>) {
    match event.event_type.as_str() {
        "payment_intent.succeeded" => (true, handle_payment_succeeded(state, event, now).await),
        "payment_intent.payment_failed" => (true, handle_payment_failed(state, event, now).await),
        "payment_intent.canceled" => (
            true,
            handle_payment_status(state, event, PaymentStatus::Canceled, now).await,
        ),
        "payment_intent.processing" => (
            true,
            handle_payment_status(state, event, PaymentStatus::Processing, now).await,
        ),
        "payment_method.attached" => (true, handle_method_attached(state, event, now).await),
        "charge.dispute.created" => (true, handle_dispute_created(state, event, now).await),
        other => {
            tracing::debug!(event_type = other, "Unhandled webhook event type");
            (false, Ok(()))
        }
    }
}

/// Upsert the payment row for this intent at the target status, enforcing
/// the payment state machine against any existing row.
async fn upsert_payment(
    state: &AppState,
    event: &Event,
    target: PaymentStatus,
    now: i64,
) -> AppResult<Option<String>> {
    let object = &event.data.object;
    let Some(intent_id) = object.id.as_deref() else {
        tracing::warn!(event_id = %event.id, "Payment event missing intent id");
        return Ok(None);
    };

    if let Some(existing) = db::payments::find_by_intent(&state.pool, intent_id).await? {
        let current = existing.status().ok_or_else(|| {
            AppError::Internal(format!("payment {} has corrupt status", existing.id))
        })?;
        if current == target {
            return Ok(existing.order_id);
        }
        if !current.can_transition_to(target) {
            return Err(AppError::InvalidTransition(format!(
                "payment {intent_id}: {current} -> {target}"
            )));
        }
    }

    let metadata = PaymentMetadata::V1 {
        order_id: object.metadata.order_id.clone(),
        customer_name: object.metadata.customer_name.clone(),
        failure_message: object
            .last_payment_error
            .as_ref()
            .and_then(|e| e.message.clone()),
    };
    let payment_id = format!("pay_{}", uuid::Uuid::new_v4());
    let user_id = object.metadata.user_id.as_deref().unwrap_or("unknown");

    db::payments::upsert_by_intent(
        &state.pool,
        &db::payments::UpsertPayment {
            id: &payment_id,
            provider_intent_id: intent_id,
            user_id,
            order_id: object.metadata.order_id.as_deref(),
            amount: object.amount.unwrap_or(0).max(0),
            currency: object.currency.as_deref().unwrap_or("eur"),
            status: target.as_str(),
            payment_method: object.payment_method.as_deref(),
            metadata: Some(&metadata.to_json()),
            now,
        },
    )
    .await?;

    Ok(object.metadata.order_id.clone())
}

/// payment_intent.succeeded → settle the payment, confirm the order,
/// notify the customer
async fn handle_payment_succeeded(state: &AppState, event: &Event, now: i64) -> AppResult<()> {
    let Some(order_id) = upsert_payment(state, event, PaymentStatus::Succeeded, now).await? else {
        return Ok(());
    };

    let Some(order) = db::orders::find_by_id(&state.pool, &order_id).await? else {
        tracing::warn!(order_id = %order_id, "Payment succeeded for unknown order");
        return Ok(());
    };

    if order.status() == Some(OrderStatus::Pending) {
        orders::transition_order(
            &state.pool,
            &order,
            OrderStatus::Confirmed,
            TransitionCause::Webhook,
            now,
        )
        .await?;

        // Delivery failure is recorded on the notification, never escalated
        let _ = state
            .dispatcher
            .send(
                &state.pool,
                &SendNotification {
                    notification_type: NotificationType::OrderConfirmation,
                    user_id: &order.user_id,
                    order_id: Some(&order.id),
                    customer_name: event.data.object.metadata.customer_name.as_deref(),
                    customer_email: event.data.object.metadata.customer_email.as_deref(),
                    customer_phone: None,
                    message_content: None,
                    delivery_method: DeliveryMethod::InApp,
                    pickup_date: Some(&order.pickup_date),
                    pickup_time: Some(&order.pickup_time),
                },
                now,
            )
            .await;
    }

    Ok(())
}

/// payment_intent.payment_failed → mark failed, tell the customer
async fn handle_payment_failed(state: &AppState, event: &Event, now: i64) -> AppResult<()> {
    let Some(order_id) = upsert_payment(state, event, PaymentStatus::Failed, now).await? else {
        return Ok(());
    };

    if let Some(order) = db::orders::find_by_id(&state.pool, &order_id).await? {
        let _ = state
            .dispatcher
            .send(
                &state.pool,
                &SendNotification {
                    notification_type: NotificationType::PaymentFailed,
                    user_id: &order.user_id,
                    order_id: Some(&order.id),
                    customer_name: event.data.object.metadata.customer_name.as_deref(),
                    customer_email: event.data.object.metadata.customer_email.as_deref(),
                    customer_phone: None,
                    message_content: None,
                    delivery_method: DeliveryMethod::InApp,
                    pickup_date: None,
                    pickup_time: None,
                },
                now,
            )
            .await;
    }

    Ok(())
}

/// payment_intent.canceled / payment_intent.processing → status update only
async fn handle_payment_status(
    state: &AppState,
    event: &Event,
    target: PaymentStatus,
    now: i64,
) -> AppResult<()> {
    upsert_payment(state, event, target, now).await?;
    Ok(())
}

/// payment_method.attached → record the method reference on the matching
/// payment, if any
async fn handle_method_attached(state: &AppState, event: &Event, now: i64) -> AppResult<()> {
    let object = &event.data.object;
    let (Some(method_id), Some(intent_id)) = (object.id.as_deref(), object.payment_intent.as_deref())
    else {
        tracing::debug!(event_id = %event.id, "payment_method.attached without an intent reference");
        return Ok(());
    };

    let matched = db::payments::set_payment_method(&state.pool, intent_id, method_id, now).await?;
    if !matched {
        tracing::debug!(intent_id = intent_id, "No payment row for attached method");
    }
    Ok(())
}

/// charge.dispute.created → succeeded payment becomes disputed
async fn handle_dispute_created(state: &AppState, event: &Event, now: i64) -> AppResult<()> {
    let Some(intent_id) = event.data.object.payment_intent.as_deref() else {
        tracing::warn!(event_id = %event.id, "Dispute event missing payment intent");
        return Ok(());
    };

    let Some(payment) = db::payments::find_by_intent(&state.pool, intent_id).await? else {
        tracing::warn!(intent_id = intent_id, "Dispute for unknown payment");
        return Ok(());
    };

    let current = payment
        .status()
        .ok_or_else(|| AppError::Internal(format!("payment {} has corrupt status", payment.id)))?;
    if !current.can_transition_to(PaymentStatus::Disputed) {
        return Err(AppError::InvalidTransition(format!(
            "payment {intent_id}: {current} -> disputed"
        )));
    }

    db::payments::transition_status(
        &state.pool,
        intent_id,
        current.as_str(),
        PaymentStatus::Disputed.as_str(),
        now,
    )
    .await?;

    tracing::info!(intent_id = intent_id, "Payment disputed");
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/webhooks/events — recent event log rows, newest first
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<WebhookEventRow>>, AppError> {
    let rows = db::webhook_events::recent(&state.pool, query.limit.clamp(1, 500)).await?;
    Ok(Json(rows))
}
