//! Unified error handling
//!
//! Provides the application error type and its HTTP mapping:
//! - [`AppError`] - application error enum
//! - [`AppResult`] - result alias used throughout the engine
//!
//! Validation-class errors (not found, bad input, illegal transition) are
//! expected negative outcomes and map to 4xx codes; infrastructure errors
//! map to 5xx and are logged before details are stripped from the response.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Unified API error body
///
/// ```json
/// {
///   "code": "E0003",
///   "message": "Resource not found: order ord_123"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// Application error enum
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Expected negative outcomes (4xx) ==========
    #[error("Resource not found: {0}")]
    /// Referenced row does not exist (404)
    NotFound(String),

    #[error("Validation failed: {0}")]
    /// Malformed or out-of-range input (400)
    Validation(String),

    #[error("Invalid status transition: {0}")]
    /// Transition not in the allowed adjacency; callers must not retry blindly (422)
    InvalidTransition(String),

    #[error("Insufficient stock: {0}")]
    /// Movement would drive stock below zero (422)
    InsufficientStock(String),

    #[error("Conflict: {0}")]
    /// Concurrent writer won a guarded update (409)
    Conflict(String),

    // ========== Infrastructure errors (5xx) ==========
    #[error("Database error: {0}")]
    /// Storage failure (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// Anything else (500)
    Internal(String),
}

impl AppError {
    /// Stable error code string for this variant
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "E0003",
            AppError::Validation(_) => "E0002",
            AppError::InvalidTransition(_) => "E4002",
            AppError::InsufficientStock(_) => "E6002",
            AppError::Conflict(_) => "E0004",
            AppError::Database(_) => "E9002",
            AppError::Internal(_) => "E9001",
        }
    }

    /// True for expected negative outcomes that must never be retried blindly
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::Validation(_)
                | AppError::InvalidTransition(_)
                | AppError::InsufficientStock(_)
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidTransition(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::InsufficientStock(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorBody {
            code: self.code().to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type for engine operations
pub type AppResult<T> = Result<T, AppError>;
