//! Notification dispatcher
//!
//! Renders a message from the per-type template, persists the record in
//! `pending`, attempts delivery through the configured channel, and writes
//! the outcome back. Delivery failure is reported to the caller but never
//! escalated to abort the caller's broader operation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db;
use crate::error::AppResult;
use crate::model::{DeliveryMethod, NotificationType};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A rendered message ready for delivery
#[derive(Debug, Clone)]
pub struct RenderedNotification {
    pub title: String,
    pub body: String,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub recipient_phone: Option<String>,
}

/// Pluggable delivery transport for non-in-app channels
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(&self, notification: &RenderedNotification) -> Result<(), BoxError>;
}

/// Template context for rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationContext<'a> {
    pub customer_name: Option<&'a str>,
    pub order_id: Option<&'a str>,
    pub pickup_date: Option<&'a str>,
    pub pickup_time: Option<&'a str>,
    /// Overrides the template body when present (generic messages)
    pub message_content: Option<&'a str>,
}

/// Render title + body from the fixed per-type template
pub fn render(kind: NotificationType, ctx: &NotificationContext<'_>) -> (String, String) {
    let name = ctx.customer_name.unwrap_or("customer");
    let order = ctx.order_id.unwrap_or("your order");

    if let Some(content) = ctx.message_content {
        return ("Storefront update".to_string(), content.to_string());
    }

    match kind {
        NotificationType::OrderConfirmation => (
            "Order confirmed".to_string(),
            format!(
                "Hi {name}, {order} is confirmed. We'll let you know when it's ready for pickup."
            ),
        ),
        NotificationType::PickupReady => (
            "Ready for pickup".to_string(),
            format!("Hi {name}, {order} is ready for pickup."),
        ),
        NotificationType::PickupReminder => {
            let when = match (ctx.pickup_date, ctx.pickup_time) {
                (Some(d), Some(t)) => format!("{d} at {t}"),
                _ => "soon".to_string(),
            };
            (
                "Pickup reminder".to_string(),
                format!("Hi {name}, a reminder that {order} is scheduled for pickup {when}."),
            )
        }
        NotificationType::OrderCancelled => (
            "Order cancelled".to_string(),
            format!("Hi {name}, {order} has been cancelled. Any reserved items were returned to stock."),
        ),
        NotificationType::PaymentFailed => (
            "Payment failed".to_string(),
            format!("Hi {name}, the payment for {order} did not go through. Please try again."),
        ),
        NotificationType::Generic => (
            "Storefront update".to_string(),
            format!("Hi {name}, there is an update about {order}."),
        ),
    }
}

pub struct SendNotification<'a> {
    pub notification_type: NotificationType,
    pub user_id: &'a str,
    pub order_id: Option<&'a str>,
    pub customer_name: Option<&'a str>,
    pub customer_email: Option<&'a str>,
    pub customer_phone: Option<&'a str>,
    pub message_content: Option<&'a str>,
    pub delivery_method: DeliveryMethod,
    pub pickup_date: Option<&'a str>,
    pub pickup_time: Option<&'a str>,
}

/// Result of one dispatch attempt
#[derive(Debug, Clone)]
pub struct NotificationOutcome {
    pub notification_id: String,
    pub delivered: bool,
    pub error: Option<String>,
}

/// Notification dispatcher with injected channels
///
/// `in_app` always succeeds synchronously (the persisted record is the
/// in-app message). External channels are collaborators registered at
/// construction; a missing channel is a recorded delivery failure, not a
/// crash.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    channels: HashMap<DeliveryMethod, Arc<dyn DeliveryChannel>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// Register an external delivery channel
    pub fn with_channel(mut self, method: DeliveryMethod, channel: Arc<dyn DeliveryChannel>) -> Self {
        self.channels.insert(method, channel);
        self
    }

    /// Render, persist pending, deliver, record the outcome.
    ///
    /// Errors are storage failures only; a failed delivery is a normal
    /// `Ok` outcome with `delivered == false`.
    pub async fn send(
        &self,
        pool: &SqlitePool,
        request: &SendNotification<'_>,
        now: i64,
    ) -> AppResult<NotificationOutcome> {
        let ctx = NotificationContext {
            customer_name: request.customer_name,
            order_id: request.order_id,
            pickup_date: request.pickup_date,
            pickup_time: request.pickup_time,
            message_content: request.message_content,
        };
        let (title, body) = render(request.notification_type, &ctx);

        let notification_id = format!("ntf_{}", Uuid::new_v4());
        db::notifications::create(
            pool,
            &db::notifications::CreateNotification {
                id: &notification_id,
                notification_type: request.notification_type.as_str(),
                user_id: request.user_id,
                order_id: request.order_id,
                recipient_name: request.customer_name,
                recipient_email: request.customer_email,
                recipient_phone: request.customer_phone,
                message_title: &title,
                message_body: &body,
                delivery_method: request.delivery_method.as_str(),
                now,
            },
        )
        .await?;

        let delivery = match request.delivery_method {
            DeliveryMethod::InApp => Ok(()),
            method => match self.channels.get(&method) {
                Some(channel) => {
                    let rendered = RenderedNotification {
                        title,
                        body,
                        recipient_name: request.customer_name.map(String::from),
                        recipient_email: request.customer_email.map(String::from),
                        recipient_phone: request.customer_phone.map(String::from),
                    };
                    channel.deliver(&rendered).await
                }
                None => Err(format!("no {} channel configured", method.as_str()).into()),
            },
        };

        match delivery {
            Ok(()) => {
                db::notifications::mark_sent(pool, &notification_id, now).await?;
                tracing::info!(
                    notification_id = %notification_id,
                    notification_type = request.notification_type.as_str(),
                    user_id = request.user_id,
                    "Notification sent"
                );
                Ok(NotificationOutcome {
                    notification_id,
                    delivered: true,
                    error: None,
                })
            }
            Err(e) => {
                let message = e.to_string();
                db::notifications::mark_failed(pool, &notification_id, &message, now).await?;
                tracing::warn!(
                    notification_id = %notification_id,
                    error = %message,
                    "Notification delivery failed"
                );
                Ok(NotificationOutcome {
                    notification_id,
                    delivered: false,
                    error: Some(message),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_known_templates() {
        let ctx = NotificationContext {
            customer_name: Some("Ada"),
            order_id: Some("ord_1"),
            ..Default::default()
        };
        let (title, body) = render(NotificationType::OrderCancelled, &ctx);
        assert_eq!(title, "Order cancelled");
        assert!(body.contains("Ada"));
        assert!(body.contains("ord_1"));

        let (title, _) = render(NotificationType::PaymentFailed, &ctx);
        assert_eq!(title, "Payment failed");
    }

    #[test]
    fn test_render_custom_content_wins() {
        let ctx = NotificationContext {
            message_content: Some("Custom body"),
            ..Default::default()
        };
        let (_, body) = render(NotificationType::OrderConfirmation, &ctx);
        assert_eq!(body, "Custom body");
    }

    #[test]
    fn test_render_defaults_without_context() {
        let ctx = NotificationContext::default();
        let (_, body) = render(NotificationType::PickupReminder, &ctx);
        assert!(body.contains("customer"));
        assert!(body.contains("soon"));
    }
}
