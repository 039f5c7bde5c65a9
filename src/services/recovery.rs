//! Error recovery coordinator
//!
//! Classifies an incoming error into a recovery strategy and executes the
//! corresponding sequence, recording an audit trail. The coordinator never
//! guesses a destructive remedy for unknown failure modes.

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::AppResult;
use crate::model::{
    CancellationReason, ErrorType, RecoveryMetadata, RecoveryStatus, RecoveryStrategy,
    TransitionCause,
};
use crate::services::orders;

pub struct RecoveryRequest<'a> {
    pub error_type: &'a str,
    pub order_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub operation: &'a str,
    pub original_error: &'a str,
    pub retry_count: i64,
    /// Caller-supplied context, stored on the record as-is
    pub metadata: Option<&'a str>,
}

/// Structured result of one recovery attempt
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryOutcome {
    pub success: bool,
    pub recovery_id: String,
    /// The chosen strategy
    pub action: String,
    pub attempts: i64,
    /// Whether the coordinator itself repaired state
    pub recovered: bool,
    /// Whether a compensating cancellation was applied
    pub compensation_applied: bool,
    pub message: String,
}

/// Classify, record, execute, finalise.
///
/// The record is created in `processing` before execution and always
/// finalised as `completed` or `failed`.
pub async fn execute_recovery(
    pool: &SqlitePool,
    request: &RecoveryRequest<'_>,
    now: i64,
) -> AppResult<RecoveryOutcome> {
    let error_type = ErrorType::parse(request.error_type);
    let strategy = error_type.strategy();
    let recovery_id = format!("rec_{}", Uuid::new_v4());

    db::recovery::create(
        pool,
        &db::recovery::CreateRecovery {
            id: &recovery_id,
            error_type: error_type.as_str(),
            order_id: request.order_id,
            user_id: request.user_id,
            operation: request.operation,
            original_error: request.original_error,
            strategy: strategy.as_str(),
            retry_count: request.retry_count,
            metadata: request.metadata,
            now,
        },
    )
    .await?;

    tracing::info!(
        recovery_id = %recovery_id,
        error_type = error_type.as_str(),
        strategy = strategy.as_str(),
        operation = request.operation,
        "Recovery attempt started"
    );

    let outcome = match strategy {
        RecoveryStrategy::Retry => {
            finish(pool, &recovery_id, RecoveryStatus::Completed,
                "classified for retry; the caller owns the retry loop", None, now).await?;
            RecoveryOutcome {
                success: true,
                recovery_id: recovery_id.clone(),
                action: strategy.as_str().to_string(),
                attempts: request.retry_count,
                recovered: false,
                compensation_applied: false,
                message: "classified for retry; the caller owns the retry loop".to_string(),
            }
        }
        RecoveryStrategy::ManualIntervention => {
            finish(pool, &recovery_id, RecoveryStatus::Completed,
                "queued for manual intervention", None, now).await?;
            RecoveryOutcome {
                success: true,
                recovery_id: recovery_id.clone(),
                action: strategy.as_str().to_string(),
                attempts: request.retry_count,
                recovered: false,
                compensation_applied: false,
                message: "queued for manual intervention".to_string(),
            }
        }
        RecoveryStrategy::Compensate => {
            compensate(pool, &recovery_id, request, now).await?
        }
        RecoveryStrategy::Rollback => rollback(pool, &recovery_id, request, now).await?,
    };

    Ok(outcome)
}

async fn finish(
    pool: &SqlitePool,
    recovery_id: &str,
    status: RecoveryStatus,
    message: &str,
    metadata: Option<&str>,
    now: i64,
) -> AppResult<()> {
    db::recovery::finalize(pool, recovery_id, status.as_str(), message, metadata, now).await?;
    Ok(())
}

/// Compensating transaction: release stock for every item on the order and
/// cancel it with reason `automatic_recovery`.
async fn compensate(
    pool: &SqlitePool,
    recovery_id: &str,
    request: &RecoveryRequest<'_>,
    now: i64,
) -> AppResult<RecoveryOutcome> {
    let base = |success, recovered, compensation_applied, message: String| RecoveryOutcome {
        success,
        recovery_id: recovery_id.to_string(),
        action: RecoveryStrategy::Compensate.as_str().to_string(),
        attempts: request.retry_count,
        recovered,
        compensation_applied,
        message,
    };

    let Some(order_id) = request.order_id else {
        let message = "compensate requires an order context";
        finish(pool, recovery_id, RecoveryStatus::Failed, message, None, now).await?;
        return Ok(base(false, false, false, message.to_string()));
    };

    let Some(order) = db::orders::find_by_id(pool, order_id).await? else {
        let message = format!("order {order_id} not found");
        finish(pool, recovery_id, RecoveryStatus::Failed, &message, None, now).await?;
        return Ok(base(false, false, false, message));
    };

    match orders::cancel_order_with_release(
        pool,
        &order,
        CancellationReason::AutomaticRecovery,
        TransitionCause::Recovery,
        now,
    )
    .await
    {
        Ok(cancel) if cancel.cancelled => {
            let all_restored = cancel.all_restored();
            let metadata = RecoveryMetadata::V1 {
                restorations: cancel.restorations,
                deleted_items: None,
            };
            let message = if all_restored {
                format!("order {order_id} cancelled and stock restored")
            } else {
                format!("order {order_id} cancelled; some items failed to restore")
            };
            finish(pool, recovery_id, RecoveryStatus::Completed, &message,
                Some(&metadata.to_json()), now).await?;
            Ok(base(true, all_restored, true, message))
        }
        Ok(_) => {
            let message = format!("order {order_id} changed concurrently; compensation skipped");
            finish(pool, recovery_id, RecoveryStatus::Failed, &message, None, now).await?;
            Ok(base(false, false, false, message))
        }
        Err(e) => {
            let message = format!("compensation failed: {e}");
            finish(pool, recovery_id, RecoveryStatus::Failed, &message, None, now).await?;
            Ok(base(false, false, false, message))
        }
    }
}

/// Destructive undo: delete the order's line items then the order itself.
/// Appropriate only for orders that never became visible to other
/// subsystems.
async fn rollback(
    pool: &SqlitePool,
    recovery_id: &str,
    request: &RecoveryRequest<'_>,
    now: i64,
) -> AppResult<RecoveryOutcome> {
    let base = |success, recovered, message: String| RecoveryOutcome {
        success,
        recovery_id: recovery_id.to_string(),
        action: RecoveryStrategy::Rollback.as_str().to_string(),
        attempts: request.retry_count,
        recovered,
        compensation_applied: false,
        message,
    };

    let Some(order_id) = request.order_id else {
        let message = "rollback requires an order context";
        finish(pool, recovery_id, RecoveryStatus::Failed, message, None, now).await?;
        return Ok(base(false, false, message.to_string()));
    };

    match db::orders::delete_with_items(pool, order_id).await? {
        Some(deleted_items) => {
            let metadata = RecoveryMetadata::V1 {
                restorations: Vec::new(),
                deleted_items: Some(deleted_items as i64),
            };
            let message = format!("order {order_id} rolled back ({deleted_items} items removed)");
            finish(pool, recovery_id, RecoveryStatus::Completed, &message,
                Some(&metadata.to_json()), now).await?;
            tracing::info!(recovery_id = %recovery_id, order_id = order_id, "Order rolled back");
            Ok(base(true, true, message))
        }
        None => {
            let message = format!("order {order_id} not found");
            finish(pool, recovery_id, RecoveryStatus::Failed, &message, None, now).await?;
            Ok(base(false, false, message))
        }
    }
}
