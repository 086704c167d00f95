//! Payment processor configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Settings for the inbound transaction callback.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// HMAC-SHA512 key issued by the processor
    pub hmac_secret: SecretString,

    /// Upper bound on ledger work for one callback, in seconds
    #[serde(default = "default_processing_timeout")]
    pub processing_timeout_secs: u64,
}

impl PaymentConfig {
    pub fn new(hmac_secret: impl Into<String>) -> Self {
        Self {
            hmac_secret: SecretString::new(hmac_secret.into()),
            processing_timeout_secs: default_processing_timeout(),
        }
    }

    /// Get processing timeout as Duration
    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_secs)
    }

    /// Validate payment configuration.
    ///
    /// The processing timeout must fire before the HTTP request timeout does,
    /// otherwise callers see a generic timeout instead of a retryable 503.
    pub fn validate(&self, request_timeout_secs: u64) -> Result<(), ValidationError> {
        if self.hmac_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYWIRE__PAYMENT__HMAC_SECRET"));
        }
        if self.processing_timeout_secs == 0 || self.processing_timeout_secs >= request_timeout_secs {
            return Err(ValidationError::InvalidProcessingTimeout);
        }
        Ok(())
    }
}

fn default_processing_timeout() -> u64 {
    10
}
