//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::CheckoutError;
use storage::StorageError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout or POS sale failure.
    Checkout(CheckoutError),
    /// Storage read failure.
    Storage(StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, order_id) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Storage(err) => storage_error_to_response(err),
        };

        let mut body = serde_json::json!({ "error": message });
        if let Some(order_id) = order_id {
            body["order_id"] = serde_json::json!(order_id);
        }
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(
    err: CheckoutError,
) -> (StatusCode, String, Option<common::OrderId>) {
    match &err {
        CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string(), None),
        CheckoutError::Persistence { order_id, .. } => {
            tracing::error!(error = %err, ?order_id, "checkout persistence failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), *order_id)
        }
    }
}

fn storage_error_to_response(err: StorageError) -> (StatusCode, String, Option<common::OrderId>) {
    match &err {
        StorageError::OrderNotFound(id) => (StatusCode::NOT_FOUND, err.to_string(), Some(*id)),
        StorageError::NegativeStock { .. } => (StatusCode::BAD_REQUEST, err.to_string(), None),
        _ => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None)
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}
