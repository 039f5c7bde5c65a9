//! Order state machine choke points
//!
//! Every order status write in the engine goes through these two
//! functions. Cancellation is only exposed as the combined
//! cancel-plus-stock-release operation, so stock compensation can never
//! be forgotten by a caller.

use sqlx::SqlitePool;

use crate::db;
use crate::error::{AppError, AppResult};
use crate::model::{
    CancellationReason, ItemRestoration, Order, OrderStatus, TransitionCause,
};

/// Apply a legal non-cancellation transition to an order.
///
/// Validates the adjacency, then writes through a guarded UPDATE that
/// re-checks the current status. A lost guard surfaces as a conflict so
/// callers can re-read instead of retrying blindly.
pub async fn transition_order(
    pool: &SqlitePool,
    order: &Order,
    to: OrderStatus,
    cause: TransitionCause,
    now: i64,
) -> AppResult<()> {
    let current = order
        .status()
        .ok_or_else(|| AppError::Internal(format!("order {} has corrupt status", order.id)))?;

    if to == OrderStatus::Cancelled {
        return Err(AppError::Validation(
            "cancellation must go through cancel_order_with_release".into(),
        ));
    }
    if !current.can_transition_to(to) {
        return Err(AppError::InvalidTransition(format!(
            "order {}: {} -> {} (cause: {})",
            order.id,
            current,
            to,
            cause.as_str()
        )));
    }

    let moved =
        db::orders::transition_status(pool, &order.id, current.as_str(), to.as_str(), now).await?;
    if !moved {
        return Err(AppError::Conflict(format!(
            "order {} moved out of {} concurrently",
            order.id, current
        )));
    }

    tracing::info!(
        order_id = %order.id,
        from = %current,
        to = %to,
        cause = cause.as_str(),
        "Order transitioned"
    );
    Ok(())
}

/// Outcome of the combined cancel + stock-release operation
pub struct CancelOutcome {
    /// Whether this call performed the cancellation (false: guard lost)
    pub cancelled: bool,
    /// Per-item stock release breakdown; empty when the guard lost
    pub restorations: Vec<ItemRestoration>,
}

impl CancelOutcome {
    /// True when every line item's stock came back
    pub fn all_restored(&self) -> bool {
        self.restorations.iter().all(|r| r.restored)
    }
}

/// Cancel an order and release the stock its items reserved, as one
/// combined operation.
///
/// The status write is atomic and race-guarded; the per-item releases run
/// after it and record partial failure instead of aborting (the order
/// must not stay active just because one item's restock failed).
pub async fn cancel_order_with_release(
    pool: &SqlitePool,
    order: &Order,
    reason: CancellationReason,
    cause: TransitionCause,
    now: i64,
) -> AppResult<CancelOutcome> {
    let current = order
        .status()
        .ok_or_else(|| AppError::Internal(format!("order {} has corrupt status", order.id)))?;

    if !current.can_transition_to(OrderStatus::Cancelled) {
        return Err(AppError::InvalidTransition(format!(
            "order {}: {} -> cancelled (cause: {})",
            order.id,
            current,
            cause.as_str()
        )));
    }

    let cancelled =
        db::orders::cancel(pool, &order.id, current.as_str(), reason.as_str(), now).await?;
    if !cancelled {
        // Concurrent writer moved the order first; nothing to release.
        return Ok(CancelOutcome {
            cancelled: false,
            restorations: Vec::new(),
        });
    }

    tracing::info!(
        order_id = %order.id,
        from = %current,
        reason = reason.as_str(),
        cause = cause.as_str(),
        "Order cancelled"
    );

    let restorations =
        super::stock::restore_order_items(pool, &order.id, reason.as_str(), Some(cause.as_str()), now)
            .await?;

    Ok(CancelOutcome {
        cancelled: true,
        restorations,
    })
}
