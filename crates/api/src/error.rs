//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use order_store::StoreError;
use orders::OrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid credentials.
    Unauthorized,
    /// Lifecycle operation error.
    Order(OrderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ApiError::Order(err) => order_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    match &err {
        OrderError::InvalidStatus(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderError::Forbidden(_) => (StatusCode::FORBIDDEN, err.to_string()),
        OrderError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, err.to_string()),
        OrderError::Store(StoreError::StatusConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        OrderError::Store(_) => {
            tracing::error!(error = %err, "store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
        OrderError::Gateway(_) => {
            tracing::error!(error = %err, "warehouse gateway failure");
            (
                StatusCode::BAD_GATEWAY,
                "reservation service unavailable".to_string(),
            )
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}
