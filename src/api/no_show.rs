//! No-show processing entry point

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::db;
use crate::model::NoShowRecord;
use crate::services::no_show::{self, NoShowOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessNoShowRequest {
    pub order_id: String,
    pub grace_period_minutes: Option<i64>,
}

/// POST /api/no-show/process
///
/// Always answers with a structured outcome; infrastructure failures are
/// folded into `success = false` rather than surfacing as a 5xx with no
/// audit trail.
pub async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessNoShowRequest>,
) -> Json<NoShowOutcome> {
    let now = chrono::Utc::now().timestamp_millis();

    match no_show::process_no_show(&state, &request.order_id, request.grace_period_minutes, now)
        .await
    {
        Ok(outcome) => Json(outcome),
        Err(e) => {
            tracing::error!(order_id = %request.order_id, error = %e, "No-show processing error");
            let grace = request
                .grace_period_minutes
                .unwrap_or(state.default_grace_minutes);
            Json(NoShowOutcome {
                success: false,
                no_show_id: None,
                order_id: request.order_id,
                pickup_deadline: None,
                detected_at: now,
                stock_restored: false,
                notification_sent: false,
                message: "no-show processing failed".to_string(),
                error: Some(e.to_string()),
                grace_period_minutes: grace,
            })
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /api/no-show/records — recent records, newest first
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<NoShowRecord>>, crate::error::AppError> {
    let rows = db::no_show::recent(&state.pool, query.limit.clamp(1, 500)).await?;
    Ok(Json(rows))
}
