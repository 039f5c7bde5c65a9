//! Domain model: closed status enumerations, transition adjacency, and
//! persisted row types.
//!
//! Statuses are stored as strings in the ledger and parsed back through the
//! `as_str`/`parse` pairs here, so every consumer matches exhaustively on
//! the closed enum rather than on raw column text.

pub mod order;
pub mod payment;
pub mod records;
pub mod stock;

pub use order::{CancellationReason, Order, OrderItem, OrderStatus, TransitionCause};
pub use payment::{Payment, PaymentMetadata, PaymentStatus};
pub use records::{
    DeliveryMethod, ErrorRecoveryRecord, ErrorType, ItemRestoration, NoShowMetadata, NoShowRecord,
    NoShowStatus, NotificationRecord, NotificationStatus, NotificationType, RecoveryMetadata,
    RecoveryStatus, RecoveryStrategy, WebhookEventRow,
};
pub use stock::{InventoryItem, MovementType, StockMovement};
