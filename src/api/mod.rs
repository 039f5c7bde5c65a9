//! API routes for the reconciliation engine

pub mod health;
pub mod no_show;
pub mod notification;
pub mod recovery;
pub mod webhook;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // RPC-style entry points for schedulers and internal callers
    let rpc = Router::new()
        .route("/api/no-show/process", post(no_show::process))
        .route("/api/no-show/records", get(no_show::recent))
        .route("/api/recovery/execute", post(recovery::execute))
        .route("/api/recovery/records", get(recovery::recent))
        .route("/api/notifications/send", post(notification::send))
        .route("/api/webhooks/events", get(webhook::recent));

    // Provider webhook (signature-verified, raw body)
    let webhook = Router::new().route("/webhooks/payments", post(webhook::handle_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(rpc)
        .merge(webhook)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
