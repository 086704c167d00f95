//! Mock session validator for testing.
//!
//! Implements the `SessionValidator` port without any token format, so tests
//! can open notification connections with fixed strings.
//!
//! # Example
//!
//! ```ignore
//! let validator = MockSessionValidator::new().with_subscriber("token-u1", "u1");
//! let subscriber = validator.validate("token-u1").await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedSubscriber, SubscriberId, Timestamp};
use crate::ports::SessionValidator;

/// Mock session validator for testing.
///
/// Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: HashMap<String, SubscriberId>,
    force_error: Option<AuthError>,
}

impl MockSessionValidator {
    /// Creates a new empty mock validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `token` as a credential of `subscriber_id`.
    ///
    /// Blank subscriber ids are ignored.
    pub fn with_subscriber(mut self, token: impl Into<String>, subscriber_id: &str) -> Self {
        if let Ok(id) = SubscriberId::new(subscriber_id) {
            self.tokens.insert(token.into(), id);
        }
        self
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(mut self, error: AuthError) -> Self {
        self.force_error = Some(error);
        self
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedSubscriber, AuthError> {
        if let Some(error) = &self.force_error {
            return Err(error.clone());
        }
        let id = self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)?;
        let expires_at = Timestamp::from_datetime(chrono::Utc::now() + chrono::Duration::hours(1));
        Ok(AuthenticatedSubscriber::new(id, expires_at))
    }
}
