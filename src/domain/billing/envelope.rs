//! Processor callback envelope.
//!
//! Parsing happens in two stages. [`WebhookEnvelope`] only checks the outer
//! shape (`type`, `obj`, optional `hmac`) so the signature can be verified
//! over the raw `obj` map. Once the signature holds,
//! [`TransactionCallback::from_obj`] deserializes the typed view the rest of
//! the pipeline works with.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::webhook_errors::WebhookError;

/// Envelope type carrying a transaction outcome.
pub const TRANSACTION_EVENT: &str = "TRANSACTION";

/// Outer callback shape as delivered by the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,

    pub obj: Map<String, Value>,

    /// Signature in the body; some deliveries carry it as a query parameter.
    #[serde(default)]
    pub hmac: Option<String>,
}

impl WebhookEnvelope {
    /// Parses the raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(body).map_err(|e| WebhookError::MalformedEnvelope(e.to_string()))
    }

    /// Returns true for transaction callbacks; everything else is acknowledged
    /// without processing.
    pub fn is_transaction(&self) -> bool {
        self.event_type == TRANSACTION_EVENT
    }

    /// Picks the signature from the body, falling back to the query string.
    pub fn signature<'a>(&'a self, query_hmac: Option<&'a str>) -> Option<&'a str> {
        self.hmac
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(query_hmac.filter(|s| !s.is_empty()))
    }
}

/// Order reference nested in the callback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderRef {
    pub id: i64,
    pub merchant_order_id: String,
}

/// Typed view of a transaction callback `obj`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionCallback {
    /// Processor transaction id; the idempotency key.
    pub id: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub success: bool,
    pub pending: bool,
    pub is_refunded: bool,
    pub is_voided: bool,
    pub created_at: String,
    pub order: OrderRef,
}

impl TransactionCallback {
    /// Deserializes the typed view from an already-verified `obj`.
    pub fn from_obj(obj: &Map<String, Value>) -> Result<Self, WebhookError> {
        Self::deserialize(Value::Object(obj.clone()))
            .map_err(|e| WebhookError::MalformedEnvelope(format!("obj: {}", e)))
    }

    /// True when the payment settled and entitles the payer to the product.
    pub fn is_settled(&self) -> bool {
        self.success && !self.pending && !self.is_refunded && !self.is_voided
    }
}
