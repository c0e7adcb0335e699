//! Error types for the JSON API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use capsule_delivery::DeliveryError;
use capsule_letter::LetterError;
use serde_json::json;
use thiserror::Error;

/// Errors that can occur in API handlers.
#[derive(Debug, Error)]
pub enum WebError {
    /// Delivery engine error.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let WebError::Delivery(err) = self;
        let (status, code, message) = match &err {
            DeliveryError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "LETTER_NOT_FOUND",
                err.to_string(),
            ),
            DeliveryError::Letter(LetterError::Locked { unlock_at }) => (
                StatusCode::LOCKED,
                "LETTER_LOCKED",
                format!("letter is locked until {unlock_at}"),
            ),
            DeliveryError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_UNAVAILABLE",
                err.to_string(),
            ),
        };
        (status, Json(json!({ "code": code, "message": message }))).into_response()
    }
}
