//! No-show processor
//!
//! Time-triggered detector for pickups that never happened. Gate checks
//! (not yet due, wrong status, unknown order) are expected negative
//! outcomes returned as structured results; only infrastructure failures
//! propagate as errors.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::model::{CancellationReason, DeliveryMethod, NoShowMetadata, NoShowStatus,
    NotificationType, TransitionCause};
use crate::services::{notifier::SendNotification, orders};
use crate::state::AppState;

/// Structured result of one no-show evaluation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoShowOutcome {
    /// True only when this call durably cancelled the order
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_show_id: Option<String>,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_deadline: Option<i64>,
    pub detected_at: i64,
    pub stock_restored: bool,
    pub notification_sent: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub grace_period_minutes: i64,
}

impl NoShowOutcome {
    fn rejected(order_id: &str, now: i64, grace: i64, message: impl Into<String>) -> Self {
        Self {
            success: false,
            no_show_id: None,
            order_id: order_id.to_string(),
            pickup_deadline: None,
            detected_at: now,
            stock_restored: false,
            notification_sent: false,
            message: message.into(),
            error: None,
            grace_period_minutes: grace,
        }
    }
}

/// Compute `pickup_date + pickup_time + grace` as UTC millis
pub fn pickup_deadline_millis(
    pickup_date: &str,
    pickup_time: &str,
    grace_minutes: i64,
) -> AppResult<i64> {
    let date = NaiveDate::parse_from_str(pickup_date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid pickup date: {pickup_date}")))?;
    let time = NaiveTime::parse_from_str(pickup_time, "%H:%M")
        .map_err(|_| AppError::Validation(format!("invalid pickup time: {pickup_time}")))?;
    let pickup_at = date.and_time(time).and_utc().timestamp_millis();
    Ok(pickup_at + grace_minutes * 60_000)
}

/// Evaluate one order's pickup deadline and, when past due, drive the
/// cancellation + compensation sequence.
///
/// Within the sequence: the status transition is atomic and race-guarded;
/// stock restoration and the customer notification run after it, each
/// failure recorded rather than fatal. The final record reflects partial
/// success per flag.
pub async fn process_no_show(
    state: &AppState,
    order_id: &str,
    grace_period_minutes: Option<i64>,
    now: i64,
) -> AppResult<NoShowOutcome> {
    let grace = grace_period_minutes.unwrap_or(state.default_grace_minutes);
    let pool = &state.pool;

    // 1. Look up the order
    let order = match db::orders::find_by_id(pool, order_id).await? {
        Some(order) => order,
        None => {
            let mut outcome =
                NoShowOutcome::rejected(order_id, now, grace, format!("order {order_id} not found"));
            outcome.error = Some("order_not_found".to_string());
            return Ok(outcome);
        }
    };

    // 2. Deadline gate: being early is a normal outcome, not a failure
    let deadline = pickup_deadline_millis(&order.pickup_date, &order.pickup_time, grace)?;
    if now <= deadline {
        let mut outcome = NoShowOutcome::rejected(order_id, now, grace, "pickup not yet due");
        outcome.pickup_deadline = Some(deadline);
        return Ok(outcome);
    }

    // 3. Status gate: only orders still awaiting pickup qualify
    let status = order
        .status()
        .ok_or_else(|| AppError::Internal(format!("order {order_id} has corrupt status")))?;
    if !status.is_active() {
        let mut outcome = NoShowOutcome::rejected(
            order_id,
            now,
            grace,
            format!("cannot process no-show from status {status}"),
        );
        outcome.pickup_deadline = Some(deadline);
        return Ok(outcome);
    }

    // 4. Record the detection before mutating anything
    let no_show_id = format!("ns_{}", Uuid::new_v4());
    db::no_show::create(
        pool,
        &db::no_show::CreateNoShow {
            id: &no_show_id,
            order_id: &order.id,
            user_id: &order.user_id,
            pickup_date: &order.pickup_date,
            pickup_time: &order.pickup_time,
            grace_period_minutes: grace,
            detected_at: now,
        },
    )
    .await?;

    // 5. Cancel + release stock as the combined operation
    let cancel = match orders::cancel_order_with_release(
        pool,
        &order,
        CancellationReason::NoShowTimeout,
        TransitionCause::NoShow,
        now,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            let _ = db::no_show::finalize(
                pool,
                &no_show_id,
                NoShowStatus::Failed.as_str(),
                false,
                false,
                None,
                now,
            )
            .await;
            let mut outcome =
                NoShowOutcome::rejected(order_id, now, grace, "no-show processing failed");
            outcome.no_show_id = Some(no_show_id);
            outcome.pickup_deadline = Some(deadline);
            outcome.error = Some(e.to_string());
            return Ok(outcome);
        }
    };

    if !cancel.cancelled {
        // A concurrent processor won the guard; this check observes the
        // already-moved status and reports the normal wrong-status result.
        let _ = db::no_show::finalize(
            pool,
            &no_show_id,
            NoShowStatus::Failed.as_str(),
            false,
            false,
            None,
            now,
        )
        .await;
        let mut outcome = NoShowOutcome::rejected(
            order_id,
            now,
            grace,
            "order status changed concurrently; nothing to do",
        );
        outcome.no_show_id = Some(no_show_id);
        outcome.pickup_deadline = Some(deadline);
        return Ok(outcome);
    }

    let stock_restored = cancel.all_restored();

    // 6. Customer notification; failure is non-fatal
    let notification = state
        .dispatcher
        .send(
            pool,
            &SendNotification {
                notification_type: NotificationType::OrderCancelled,
                user_id: &order.user_id,
                order_id: Some(&order.id),
                customer_name: None,
                customer_email: None,
                customer_phone: None,
                message_content: None,
                delivery_method: DeliveryMethod::InApp,
                pickup_date: Some(&order.pickup_date),
                pickup_time: Some(&order.pickup_time),
            },
            now,
        )
        .await;

    let (notification_sent, notification_id, notification_error) = match notification {
        Ok(outcome) => (outcome.delivered, Some(outcome.notification_id), outcome.error),
        Err(e) => {
            tracing::warn!(order_id = order_id, error = %e, "No-show notification failed");
            (false, None, Some(e.to_string()))
        }
    };

    // 7. Finalise the audit record with per-step outcomes
    let metadata = NoShowMetadata::V1 {
        restorations: cancel.restorations,
        notification_id,
        notification_error,
    };
    db::no_show::finalize(
        pool,
        &no_show_id,
        NoShowStatus::Completed.as_str(),
        stock_restored,
        notification_sent,
        Some(&metadata.to_json()),
        now,
    )
    .await?;

    tracing::info!(
        order_id = order_id,
        no_show_id = %no_show_id,
        stock_restored = stock_restored,
        notification_sent = notification_sent,
        "No-show processed"
    );

    Ok(NoShowOutcome {
        success: true,
        no_show_id: Some(no_show_id),
        order_id: order.id,
        pickup_deadline: Some(deadline),
        detected_at: now,
        stock_restored,
        notification_sent,
        message: "order cancelled after missed pickup".to_string(),
        error: None,
        grace_period_minutes: grace,
    })
}

/// Summary of one scan pass
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub examined: usize,
    pub cancelled: usize,
}

/// Sweep every active order and run the processor on those past deadline.
/// Orders with unparseable pickup fields are logged and skipped.
pub async fn scan_due_orders(state: &AppState, now: i64) -> AppResult<ScanSummary> {
    let active = db::orders::find_active(&state.pool).await?;
    let examined = active.len();
    let mut cancelled = 0;

    for order in active {
        let deadline = match pickup_deadline_millis(
            &order.pickup_date,
            &order.pickup_time,
            state.default_grace_minutes,
        ) {
            Ok(deadline) => deadline,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Skipping order with bad pickup schedule");
                continue;
            }
        };
        if now <= deadline {
            continue;
        }
        match process_no_show(state, &order.id, None, now).await {
            Ok(outcome) if outcome.success => cancelled += 1,
            Ok(outcome) => {
                tracing::debug!(order_id = %order.id, message = %outcome.message, "No-show scan skipped order")
            }
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "No-show scan failed for order")
            }
        }
    }

    if cancelled > 0 {
        tracing::info!(examined, cancelled, "No-show scan pass complete");
    }

    Ok(ScanSummary { examined, cancelled })
}
