//! Payment-provider wire concerns: webhook signature verification and the
//! typed event envelope.
//!
//! Only the signature scheme and event shape live here; everything else
//! about the provider is out of scope for the engine.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

/// Maximum accepted age of a signed webhook, in seconds
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify a webhook signature header of the form `t=<unix>,v1=<hex>`
///
/// The signed payload is `"{timestamp}.{body}"` under HMAC-SHA256 with the
/// shared secret; comparison is constant-time. Events older than five
/// minutes are rejected to prevent replay.
pub fn verify_signature(payload: &[u8], sig_header: &str, secret: &str) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

/// Sign a payload the way the provider does; used by tests and tooling
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    // HMAC accepts keys of any length, so this cannot fail
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(signed_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

/// Provider event envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Provider-assigned unique event identifier (the idempotency key)
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

/// The object inside `data`; a payment intent for payment events, a
/// payment method for attach events, a dispute for dispute events.
/// Fields not present on a given object type default to None.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Set on dispute objects: the payment intent under dispute
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub metadata: EventMetadata,
    #[serde(default)]
    pub last_payment_error: Option<PaymentError>,
}

/// Storefront-assigned metadata echoed back by the provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventMetadata {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentError {
    #[serde(default)]
    pub message: Option<String>,
}

impl Event {
    /// Parse a verified raw body into the typed envelope
    pub fn parse(body: &[u8]) -> Result<Event, serde_json::Error> {
        serde_json::from_slice(body)
    }
}
