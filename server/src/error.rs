//! Error types for the HTTP handlers.
//!
//! Bridges the engine's error taxonomy to HTTP responses. Validation-class
//! rejections map to specific 4xx codes the client can act on; storage
//! failures stay opaque 500s (the engine already rolled everything back).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use meetlocal_core::error::{AdmissionError, CancellationError, PaymentError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Wraps domain errors and implements Axum's `IntoResponse` trait to
/// convert them into JSON error responses.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self { status, message, code, source: None }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST".to_string())
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), code.into())
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message.into(), code.into())
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 502 Bad Gateway error (payment collaborator failures).
    #[must_use]
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message.into(), "PAYMENT_GATEWAY".to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse { code: self.code, message: self.message };
        (self.status, Json(body)).into_response()
    }
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        match &err {
            AdmissionError::EventNotFound(id) => Self::not_found("Event", id),
            AdmissionError::EventNotOpen => {
                Self::validation(err.to_string(), "EVENT_NOT_OPEN")
            }
            AdmissionError::CapacityExceeded => {
                Self::conflict(err.to_string(), "CAPACITY_EXCEEDED")
            }
            AdmissionError::DuplicateRegistration => {
                Self::conflict(err.to_string(), "DUPLICATE_REGISTRATION")
            }
            AdmissionError::CompanionConflict => {
                Self::validation(err.to_string(), "COMPANION_CONFLICT")
            }
            AdmissionError::AgeBracketMismatch { .. } => {
                Self::validation(err.to_string(), "AGE_BRACKET_MISMATCH")
            }
            AdmissionError::Storage(_) => {
                Self::internal("Registration could not be completed").with_source(err.into())
            }
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match &err {
            PaymentError::PaymentNotFound(id) => Self::not_found("Payment", id),
            PaymentError::EventNotFound(id) => Self::not_found("Event", id),
            PaymentError::EventAlreadyHeld => {
                Self::validation(err.to_string(), "EVENT_ALREADY_HELD")
            }
            PaymentError::CapacityExceeded => Self::conflict(err.to_string(), "CAPACITY_EXCEEDED"),
            PaymentError::AlreadyPaid(_) => Self::conflict(err.to_string(), "ALREADY_PAID"),
            PaymentError::Gateway(_) => Self::gateway(err.to_string()),
            PaymentError::Storage(_) => {
                Self::internal("Payment could not be processed").with_source(err.into())
            }
        }
    }
}

impl From<CancellationError> for AppError {
    fn from(err: CancellationError) -> Self {
        match &err {
            CancellationError::NoActiveRegistration => Self::new(
                StatusCode::NOT_FOUND,
                err.to_string(),
                "NO_ACTIVE_REGISTRATION".to_string(),
            ),
            CancellationError::EventNotFound(id) => Self::not_found("Event", id),
            CancellationError::Storage(_) => {
                Self::internal("Cancellation could not be completed").with_source(err.into())
            }
        }
    }
}

impl From<meetlocal_core::error::StoreError> for AppError {
    fn from(err: meetlocal_core::error::StoreError) -> Self {
        Self::internal("An internal error occurred").with_source(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetlocal_core::types::EventId;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn capacity_exceeded_maps_to_conflict() {
        let err: AppError = AdmissionError::CapacityExceeded.into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "CAPACITY_EXCEEDED");
    }

    #[test]
    fn event_not_found_maps_to_404() {
        let err: AppError = AdmissionError::EventNotFound(EventId::new()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_errors_stay_opaque() {
        let err: AppError =
            AdmissionError::Storage(meetlocal_core::error::StoreError::backend("boom")).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Registration could not be completed");
    }
}
