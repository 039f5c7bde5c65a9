//! Audit-trail record types: no-show, error recovery, notification, webhook
//! event log, plus their status/strategy enumerations and versioned
//! metadata variants.

use serde::{Deserialize, Serialize};

// ============================================================================
// No-show records
// ============================================================================

/// Processing status of a no-show record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoShowStatus {
    Processing,
    StockRestored,
    NotificationSent,
    Completed,
    Failed,
}

impl NoShowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoShowStatus::Processing => "processing",
            NoShowStatus::StockRestored => "stock_restored",
            NoShowStatus::NotificationSent => "notification_sent",
            NoShowStatus::Completed => "completed",
            NoShowStatus::Failed => "failed",
        }
    }
}

/// Per-item outcome of a stock restoration pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemRestoration {
    pub inventory_item_id: String,
    pub quantity: i64,
    pub restored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Versioned no-show metadata, persisted as JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "v", rename_all = "snake_case")]
pub enum NoShowMetadata {
    V1 {
        restorations: Vec<ItemRestoration>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notification_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notification_error: Option<String>,
    },
}

impl NoShowMetadata {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}

/// Persisted no-show record; append-only audit trail, mutated only by the
/// no-show processor
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct NoShowRecord {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub pickup_date: String,
    pub pickup_time: String,
    pub grace_period_minutes: i64,
    pub detected_at: i64,
    pub status: String,
    pub stock_restored: bool,
    pub notification_sent: bool,
    pub metadata: Option<String>,
    pub completed_at: Option<i64>,
}

// ============================================================================
// Error recovery records
// ============================================================================

/// Known error classes the coordinator can recover from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    PaymentFailed,
    StockUpdateFailed,
    OrderCreationFailed,
    NotificationFailed,
    DatabaseError,
    NetworkError,
    /// Anything the coordinator has no mapping for
    Unknown(String),
}

impl ErrorType {
    pub fn parse(s: &str) -> Self {
        match s {
            "payment_failed" => ErrorType::PaymentFailed,
            "stock_update_failed" => ErrorType::StockUpdateFailed,
            "order_creation_failed" => ErrorType::OrderCreationFailed,
            "notification_failed" => ErrorType::NotificationFailed,
            "database_error" => ErrorType::DatabaseError,
            "network_error" => ErrorType::NetworkError,
            other => ErrorType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ErrorType::PaymentFailed => "payment_failed",
            ErrorType::StockUpdateFailed => "stock_update_failed",
            ErrorType::OrderCreationFailed => "order_creation_failed",
            ErrorType::NotificationFailed => "notification_failed",
            ErrorType::DatabaseError => "database_error",
            ErrorType::NetworkError => "network_error",
            ErrorType::Unknown(s) => s,
        }
    }

    /// Fixed error-type → strategy mapping; deterministic by construction
    pub fn strategy(&self) -> RecoveryStrategy {
        match self {
            ErrorType::PaymentFailed => RecoveryStrategy::Retry,
            ErrorType::StockUpdateFailed => RecoveryStrategy::Compensate,
            ErrorType::OrderCreationFailed => RecoveryStrategy::Rollback,
            ErrorType::NotificationFailed => RecoveryStrategy::Retry,
            ErrorType::DatabaseError => RecoveryStrategy::Retry,
            ErrorType::NetworkError => RecoveryStrategy::Retry,
            ErrorType::Unknown(_) => RecoveryStrategy::ManualIntervention,
        }
    }
}

/// How the coordinator responds to a classified error
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    /// Classify and log; the caller owns the retry loop
    Retry,
    /// Restore stock and cancel the order (compensating transaction)
    Compensate,
    /// Delete the order and its items (destructive undo for never-visible orders)
    Rollback,
    /// No automatic remedy for unknown failure modes
    ManualIntervention,
}

impl RecoveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::Retry => "retry",
            RecoveryStrategy::Compensate => "compensate",
            RecoveryStrategy::Rollback => "rollback",
            RecoveryStrategy::ManualIntervention => "manual_intervention",
        }
    }
}

/// Terminal status of a recovery attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    Processing,
    Completed,
    Failed,
}

impl RecoveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStatus::Processing => "processing",
            RecoveryStatus::Completed => "completed",
            RecoveryStatus::Failed => "failed",
        }
    }
}

/// Versioned recovery metadata, persisted as JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "v", rename_all = "snake_case")]
pub enum RecoveryMetadata {
    V1 {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        restorations: Vec<ItemRestoration>,
        #[serde(skip_serializing_if = "Option::is_none")]
        deleted_items: Option<i64>,
    },
}

impl RecoveryMetadata {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}

/// Persisted recovery attempt; one row per attempt, finalised exactly once
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ErrorRecoveryRecord {
    pub id: String,
    pub error_type: String,
    pub order_id: Option<String>,
    pub user_id: Option<String>,
    pub operation: String,
    pub original_error: String,
    pub strategy: String,
    pub retry_count: i64,
    pub metadata: Option<String>,
    pub status: String,
    pub result_message: Option<String>,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

// ============================================================================
// Notification records
// ============================================================================

/// Message template families
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderConfirmation,
    PickupReady,
    PickupReminder,
    OrderCancelled,
    PaymentFailed,
    Generic,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::OrderConfirmation => "order_confirmation",
            NotificationType::PickupReady => "pickup_ready",
            NotificationType::PickupReminder => "pickup_reminder",
            NotificationType::OrderCancelled => "order_cancelled",
            NotificationType::PaymentFailed => "payment_failed",
            NotificationType::Generic => "generic",
        }
    }

    /// Unknown types fall back to the generic template
    pub fn parse(s: &str) -> Self {
        match s {
            "order_confirmation" => NotificationType::OrderConfirmation,
            "pickup_ready" => NotificationType::PickupReady,
            "pickup_reminder" => NotificationType::PickupReminder,
            "order_cancelled" => NotificationType::OrderCancelled,
            "payment_failed" => NotificationType::PaymentFailed,
            _ => NotificationType::Generic,
        }
    }
}

/// Delivery channel selector
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    InApp,
    Email,
    Sms,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::InApp => "in_app",
            DeliveryMethod::Email => "email",
            DeliveryMethod::Sms => "sms",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_app" => Some(DeliveryMethod::InApp),
            "email" => Some(DeliveryMethod::Email),
            "sms" => Some(DeliveryMethod::Sms),
            _ => None,
        }
    }
}

/// Delivery outcome status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }
}

/// Persisted notification; created pending, updated once with the outcome
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct NotificationRecord {
    pub id: String,
    pub notification_type: String,
    pub user_id: String,
    pub order_id: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
    pub message_title: String,
    pub message_body: String,
    pub delivery_method: String,
    pub status: String,
    pub error_message: Option<String>,
    pub retry_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

// ============================================================================
// Webhook event log
// ============================================================================

/// Write-once webhook event row; event_id uniqueness is the deduplication gate
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct WebhookEventRow {
    pub event_id: String,
    pub event_type: String,
    pub processed_at: i64,
    pub success: bool,
    pub error_message: Option<String>,
    pub payload: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_mapping_is_deterministic() {
        assert_eq!(
            ErrorType::parse("stock_update_failed").strategy(),
            RecoveryStrategy::Compensate
        );
        assert_eq!(
            ErrorType::parse("order_creation_failed").strategy(),
            RecoveryStrategy::Rollback
        );
        for retryable in [
            "payment_failed",
            "notification_failed",
            "database_error",
            "network_error",
        ] {
            assert_eq!(ErrorType::parse(retryable).strategy(), RecoveryStrategy::Retry);
        }
        assert_eq!(
            ErrorType::parse("unknown_x").strategy(),
            RecoveryStrategy::ManualIntervention
        );
        assert_eq!(
            ErrorType::parse("unknown_x").strategy(),
            ErrorType::parse("unknown_x").strategy()
        );
    }

    #[test]
    fn test_notification_type_fallback() {
        assert_eq!(
            NotificationType::parse("order_cancelled"),
            NotificationType::OrderCancelled
        );
        assert_eq!(NotificationType::parse("carrier_pigeon"), NotificationType::Generic);
    }

    #[test]
    fn test_no_show_metadata_round_trip() {
        let meta = NoShowMetadata::V1 {
            restorations: vec![ItemRestoration {
                inventory_item_id: "inv_1".into(),
                quantity: 2,
                restored: true,
                movement_id: Some("mov_1".into()),
                error: None,
            }],
            notification_id: None,
            notification_error: Some("channel offline".into()),
        };
        let back: NoShowMetadata = serde_json::from_str(&meta.to_json()).expect("parse");
        assert_eq!(back, meta);
    }
}
