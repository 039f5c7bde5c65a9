//! Notification entry point

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::model::{DeliveryMethod, NotificationType};
use crate::services::notifier::SendNotification;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    pub notification_type: String,
    pub user_id: String,
    pub order_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub message_content: Option<String>,
    pub delivery_method: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
    pub message: String,
    pub delivery_method: String,
    pub notification_type: String,
}

/// POST /api/notifications/send
pub async fn send(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Json<SendNotificationResponse> {
    let now = chrono::Utc::now().timestamp_millis();
    let notification_type = NotificationType::parse(&request.notification_type);
    let delivery_method = request
        .delivery_method
        .as_deref()
        .and_then(DeliveryMethod::parse)
        .unwrap_or(DeliveryMethod::InApp);

    let result = state
        .dispatcher
        .send(
            &state.pool,
            &SendNotification {
                notification_type,
                user_id: &request.user_id,
                order_id: request.order_id.as_deref(),
                customer_name: request.customer_name.as_deref(),
                customer_email: request.customer_email.as_deref(),
                customer_phone: request.customer_phone.as_deref(),
                message_content: request.message_content.as_deref(),
                delivery_method,
                pickup_date: None,
                pickup_time: None,
            },
            now,
        )
        .await;

    match result {
        Ok(outcome) => Json(SendNotificationResponse {
            success: outcome.delivered,
            notification_id: Some(outcome.notification_id),
            message: outcome
                .error
                .unwrap_or_else(|| "notification sent".to_string()),
            delivery_method: delivery_method.as_str().to_string(),
            notification_type: notification_type.as_str().to_string(),
        }),
        Err(e) => {
            tracing::error!(user_id = %request.user_id, error = %e, "Notification dispatch error");
            Json(SendNotificationResponse {
                success: false,
                notification_id: None,
                message: format!("notification failed: {e}"),
                delivery_method: delivery_method.as_str().to_string(),
                notification_type: notification_type.as_str().to_string(),
            })
        }
    }
}
