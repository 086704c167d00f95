//! Session validation port for real-time handshake credentials.
//!
//! Connections to the notification channel present a bearer token issued by
//! the platform's auth domain. This port checks it and yields the subscriber
//! the connection is bound to.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedSubscriber};

/// Validates bearer tokens and extracts subscriber identity.
///
/// # Contract
///
/// Implementations must:
/// - Validate the token signature
/// - Validate expiry (and issuer when configured)
/// - Return `AuthError::InvalidToken` for malformed/bad signature tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedSubscriber, AuthError>;
}
