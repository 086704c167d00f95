//! Data Transfer Objects for the processor callback endpoint.

use serde::{Deserialize, Serialize};

use crate::application::WebhookOutcome;

/// Query string accepted alongside the callback body.
#[derive(Debug, Default, Deserialize)]
pub struct HmacQuery {
    #[serde(default)]
    pub hmac: Option<String>,
}

/// Acknowledgement returned for every accepted callback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub received: bool,
    pub status: String,
}

impl From<WebhookOutcome> for WebhookAck {
    fn from(outcome: WebhookOutcome) -> Self {
        Self {
            received: true,
            status: outcome.as_str().to_string(),
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
