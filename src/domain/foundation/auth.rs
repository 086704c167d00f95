//! Authentication types for the domain layer.
//!
//! These types represent a subscriber whose bearer credential was validated
//! at a real-time handshake. They have **no external dependencies** - the
//! `SessionValidator` port populates them from whatever token format the
//! platform issues.

use super::{SubscriberId, Timestamp};
use thiserror::Error;

/// Subscriber identity extracted from a validated bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubscriber {
    /// The subscriber the credential was issued to.
    pub id: SubscriberId,

    /// When the credential stops being valid.
    pub expires_at: Timestamp,
}

impl AuthenticatedSubscriber {
    pub fn new(id: SubscriberId, expires_at: Timestamp) -> Self {
        Self { id, expires_at }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("Missing bearer token")]
    MissingToken,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid token")]
    InvalidToken,

    /// The token signature is valid but it has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The token could not be checked (configuration, key material).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
