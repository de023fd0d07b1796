//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use refhub_core::ReferralError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - duplicate resource or a request no longer available.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Wallet shortfall. Carries enough detail for the client to prompt
    /// a recharge.
    #[error("insufficient balance: available={balance}, required={required}")]
    InsufficientBalance {
        /// Currently available balance in paise.
        balance: i64,
        /// Required amount in paise.
        required: i64,
        /// How much is missing, in paise.
        shortfall: i64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientBalance {
                balance,
                required,
                shortfall,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_balance",
                self.to_string(),
                Some(serde_json::json!({
                    "balance_paise": balance,
                    "required_paise": required,
                    "shortfall_paise": shortfall
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
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

impl From<ReferralError> for ApiError {
    fn from(err: ReferralError) -> Self {
        match err {
            ReferralError::Validation(msg) => Self::BadRequest(msg),
            ReferralError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            ReferralError::Conflict(msg) => Self::Conflict(msg),
            ReferralError::InsufficientBalance {
                balance,
                required,
                shortfall,
            } => Self::InsufficientBalance {
                balance,
                required,
                shortfall,
            },
            ReferralError::InvalidId(err) => Self::BadRequest(err.to_string()),
            ReferralError::Storage(msg) | ReferralError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
