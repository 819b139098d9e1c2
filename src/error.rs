//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Missing or invalid API keys
/// - **Rate Limiting**: Quota exceeded; retryable after the window resets
/// - **Resource Errors**: Requested resources not found
/// - **Validation Errors**: Invalid request data
///
/// Audit-sink failures never surface here: the emitter logs and swallows
/// them so a slow or broken sink cannot fail a mutation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// Returns HTTP 500 with details hidden from the client.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// API key is missing, unknown, inactive/revoked, or expired.
    ///
    /// The String carries the specific reason. Returns HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// The key's per-window quota is exhausted.
    ///
    /// Returns HTTP 429 with a `retryAfter` (seconds) in the body.
    #[error("Rate limit exceeded: {limit} requests per minute")]
    RateLimited { limit: i32, retry_after: i64 },

    /// Requested shipment does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Shipment {0} not found")]
    ShipmentNotFound(Uuid),

    /// Requested API key record does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("API key {0} not found")]
    ApiKeyNotFound(Uuid),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::ShipmentNotFound(_) | AppError::ApiKeyNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable error code used in response bodies.
    fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "internal_error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::RateLimited { .. } => "rate_limit_exceeded",
            AppError::ShipmentNotFound(_) => "shipment_not_found",
            AppError::ApiKeyNotFound(_) => "api_key_not_found",
            AppError::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": "error_code",
///   "message": "Human-readable error message"
/// }
/// ```
///
/// Rate-limit errors additionally carry `retryAfter` (seconds until the
/// current window resets).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Never leak query/connection details to clients
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("database error: {e}");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = match self {
            AppError::RateLimited { retry_after, .. } => Json(json!({
                "error": code,
                "message": message,
                "retryAfter": retry_after,
            })),
            _ => Json(json!({
                "error": code,
                "message": message,
            })),
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        let id = Uuid::new_v4();
        assert_eq!(
            AppError::Unauthorized("API key missing".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::RateLimited { limit: 100, retry_after: 30 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::ShipmentNotFound(id).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ApiKeyNotFound(id).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let response = AppError::RateLimited { limit: 2, retry_after: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn rate_limited_message_names_the_limit() {
        let err = AppError::RateLimited { limit: 2, retry_after: 42 };
        assert_eq!(err.to_string(), "Rate limit exceeded: 2 requests per minute");
    }
}
