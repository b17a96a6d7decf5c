use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::services::api::ApiError;
use crate::services::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: ValidationError,
    },

    #[error("Booking API error: {message}")]
    Upstream {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wrap a form error with its message in the UI language.
    pub fn invalid(source: ValidationError, lang: &str) -> Self {
        AppError::Validation {
            message: source.user_message(lang),
            source,
        }
    }

    /// Wrap a failed booking API call with its message in the UI language.
    pub fn upstream(source: ApiError, lang: &str) -> Self {
        AppError::Upstream {
            message: source.user_message(lang),
            source,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
            AppError::RateLimited {
                retry_after_seconds,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                self.to_string(),
                Some(json!({ "retry_after_seconds": retry_after_seconds })),
            ),
            AppError::Validation { message, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                message.clone(),
                None,
            ),
            AppError::Upstream { message, source } => {
                tracing::warn!("Booking API error: {}", source);
                let details = match source {
                    ApiError::Status { status, .. } => Some(json!({ "status": status })),
                    _ => None,
                };
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message.clone(), details)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
