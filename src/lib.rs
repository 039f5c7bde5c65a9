//! Tidepool — order/payment reconciliation and recovery engine
//!
//! The subsystem behind a pickup storefront that has to stay consistent
//! when the outside world does not cooperate:
//!
//! - **Webhook ingress** (`api::webhook`, `provider`): signature-verified,
//!   exactly-once ingestion of at-least-once payment events
//! - **State machine** (`model`, `services::orders`): legal order/payment
//!   transitions, cancellation always paired with stock release
//! - **Stock reconciler** (`services::stock`): atomic signed deltas with a
//!   movement journal
//! - **No-show processor** (`services::no_show`): deadline-driven
//!   cancellation + compensation with partial-failure reporting
//! - **Error recovery coordinator** (`services::recovery`): typed
//!   retry/compensate/rollback/manual strategies with an audit trail
//! - **Notification dispatcher** (`services::notifier`): templated
//!   messages over pluggable channels, never fatal to callers

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod provider;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
