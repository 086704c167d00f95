//! Webhook error types for processor callback handling.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

use super::order_identifier::OrderIdentifierError;
use super::signature::SignatureError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Body is not a structurally valid callback envelope.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Signature verification failed.
    #[error("Invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    /// Composite order identifier could not be decoded.
    #[error("Invalid order identifier: {0}")]
    InvalidOrderIdentifier(#[from] OrderIdentifierError),

    /// Ledger or subscription write failed and was rolled back.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Processing did not finish within the configured bound.
    #[error("Processing timed out")]
    Timeout,

    /// Unclassified failure caught at the endpoint boundary.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebhookError {
    /// Returns true if the processor should retry delivering this callback.
    ///
    /// Safe because the ledger classifies a redelivery of a committed
    /// transaction as already processed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Persistence(_) | WebhookError::Timeout | WebhookError::Internal(_)
        )
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// - 4xx: rejected, zero side effects, no retry
    /// - 5xx: failed before commit, processor retries
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MalformedEnvelope(_)
            | WebhookError::InvalidSignature(_)
            | WebhookError::InvalidOrderIdentifier(_) => StatusCode::BAD_REQUEST,

            WebhookError::Timeout => StatusCode::SERVICE_UNAVAILABLE,

            WebhookError::Persistence(_) | WebhookError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::MalformedEnvelope(_) => "MALFORMED_ENVELOPE",
            WebhookError::InvalidSignature(_) => "INVALID_SIGNATURE",
            WebhookError::InvalidOrderIdentifier(_) => "INVALID_ORDER_IDENTIFIER",
            WebhookError::Persistence(_) => "PERSISTENCE_ERROR",
            WebhookError::Timeout => "PROCESSING_TIMEOUT",
            WebhookError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
