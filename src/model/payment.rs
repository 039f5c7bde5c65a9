//! Payment rows and the payment status state machine

use serde::{Deserialize, Serialize};

/// Payment lifecycle status as reported by the provider
///
/// pending → processing → {succeeded | failed | canceled}; providers may
/// skip `processing` and settle directly from pending. `requires_action`
/// (SCA/3DS challenges) is reachable from pending/processing and resolves
/// back into the main path. `succeeded → disputed` is the only transition
/// out of a terminal settlement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Disputed,
    RequiresAction,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Disputed => "disputed",
            PaymentStatus::RequiresAction => "requires_action",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "processing" => Some(PaymentStatus::Processing),
            "succeeded" => Some(PaymentStatus::Succeeded),
            "failed" => Some(PaymentStatus::Failed),
            "canceled" => Some(PaymentStatus::Canceled),
            "disputed" => Some(PaymentStatus::Disputed),
            "requires_action" => Some(PaymentStatus::RequiresAction),
            _ => None,
        }
    }

    /// Allowed transition adjacency
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        match (self, next) {
            (Pending, Processing | Succeeded | Failed | Canceled | RequiresAction) => true,
            (Processing, Succeeded | Failed | Canceled | RequiresAction) => true,
            (RequiresAction, Processing | Succeeded | Failed | Canceled) => true,
            (Succeeded, Disputed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Versioned payment metadata, persisted as JSON
///
/// Closed variant instead of an open-ended map so new fields are
/// compile-time checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "v", rename_all = "snake_case")]
pub enum PaymentMetadata {
    V1 {
        #[serde(skip_serializing_if = "Option::is_none")]
        order_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        customer_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        failure_message: Option<String>,
    },
}

impl PaymentMetadata {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}

/// Persisted payment row; at most one per provider payment-intent id
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Payment {
    pub id: String,
    pub provider_intent_id: String,
    pub user_id: String,
    pub order_id: Option<String>,
    /// Minor currency units, non-negative
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub metadata: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Payment {
    pub fn status(&self) -> Option<PaymentStatus> {
        PaymentStatus::parse(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_transitions() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Processing));
        assert!(PaymentStatus::Processing.can_transition_to(PaymentStatus::Succeeded));
        assert!(PaymentStatus::Processing.can_transition_to(PaymentStatus::Failed));
        assert!(PaymentStatus::Processing.can_transition_to(PaymentStatus::Canceled));
        // Providers may settle straight from pending
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Succeeded));
    }

    #[test]
    fn test_dispute_only_from_succeeded() {
        assert!(PaymentStatus::Succeeded.can_transition_to(PaymentStatus::Disputed));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Disputed));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Disputed));
    }

    #[test]
    fn test_terminal_states() {
        for terminal in [
            PaymentStatus::Failed,
            PaymentStatus::Canceled,
            PaymentStatus::Disputed,
        ] {
            assert!(!terminal.can_transition_to(PaymentStatus::Succeeded));
            assert!(!terminal.can_transition_to(PaymentStatus::Pending));
        }
    }

    #[test]
    fn test_metadata_json_round_trip() {
        let meta = PaymentMetadata::V1 {
            order_id: Some("ord_1".into()),
            customer_name: None,
            failure_message: None,
        };
        let json = meta.to_json();
        let back: PaymentMetadata = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, meta);
    }
}
