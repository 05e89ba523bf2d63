//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures unexpected errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use boutik_checkout::{CheckoutError, GatewayError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Checkout flow error.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment backend setup failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side faults to Sentry; checkout errors are
        // ordinary user outcomes.
        if matches!(self, Self::Internal(_) | Self::Gateway(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) | CheckoutError::OtpFormat { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CheckoutError::Initialization(_) | CheckoutError::Provider(_) => {
                    StatusCode::BAD_GATEWAY
                }
                CheckoutError::InvalidTransition(_) => StatusCode::CONFLICT,
            },
            Self::Gateway(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = match &self {
            Self::Checkout(CheckoutError::Validation(errors)) => json!({
                "error": "validation",
                "fields": errors,
            }),
            Self::Checkout(err) => json!({
                "error": "checkout",
                "message": err.to_string(),
            }),
            // Don't expose internal error details to clients
            Self::Gateway(_) | Self::Internal(_) => json!({
                "error": "internal",
                "message": "Internal server error",
            }),
            Self::NotFound(what) => json!({
                "error": "not_found",
                "message": what,
            }),
            Self::BadRequest(message) => json!({
                "error": "bad_request",
                "message": message,
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
