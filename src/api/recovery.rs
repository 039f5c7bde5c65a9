//! Error recovery entry point

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::db;
use crate::model::ErrorRecoveryRecord;
use crate::services::recovery::{self, RecoveryOutcome, RecoveryRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRecoveryRequest {
    pub error_type: String,
    pub order_id: Option<String>,
    pub user_id: Option<String>,
    pub operation: String,
    pub original_error: String,
    #[serde(default)]
    pub retry_count: i64,
    pub metadata: Option<serde_json::Value>,
}

/// POST /api/recovery/execute
pub async fn execute(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRecoveryRequest>,
) -> Json<RecoveryOutcome> {
    let now = chrono::Utc::now().timestamp_millis();
    let metadata = request.metadata.as_ref().map(|v| v.to_string());

    let result = recovery::execute_recovery(
        &state.pool,
        &RecoveryRequest {
            error_type: &request.error_type,
            order_id: request.order_id.as_deref(),
            user_id: request.user_id.as_deref(),
            operation: &request.operation,
            original_error: &request.original_error,
            retry_count: request.retry_count,
            metadata: metadata.as_deref(),
        },
        now,
    )
    .await;

    match result {
        Ok(outcome) => Json(outcome),
        Err(e) => {
            tracing::error!(
                error_type = %request.error_type,
                operation = %request.operation,
                error = %e,
                "Recovery execution error"
            );
            Json(RecoveryOutcome {
                success: false,
                recovery_id: String::new(),
                action: "none".to_string(),
                attempts: request.retry_count,
                recovered: false,
                compensation_applied: false,
                message: format!("recovery failed: {e}"),
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

/// GET /api/recovery/records — recent attempts, newest first
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<ErrorRecoveryRecord>>, crate::error::AppError> {
    let rows = db::recovery::recent(&state.pool, query.limit.clamp(1, 500)).await?;
    Ok(Json(rows))
}
