//! Ledger record of a processed processor transaction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{Timestamp, TransactionId};

use super::envelope::TransactionCallback;

/// Immutable record written once per processor transaction id.
///
/// # Invariants
///
/// - `external_id` is unique across the ledger
/// - never updated after insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub external_id: TransactionId,

    /// Amount in minor units (never floats).
    pub amount_cents: i64,

    /// ISO currency code as reported by the processor.
    pub currency: String,

    pub success: bool,

    /// Raw composite order identifier, kept for audit.
    pub merchant_order_id: String,

    /// Verified `obj` exactly as received.
    pub raw_snapshot: Value,

    pub processed_at: Timestamp,
}

impl TransactionRecord {
    /// Builds the record for a verified callback.
    pub fn from_callback(
        callback: &TransactionCallback,
        obj: &Map<String, Value>,
        processed_at: Timestamp,
    ) -> Self {
        Self {
            external_id: TransactionId::new(callback.id),
            amount_cents: callback.amount_cents,
            currency: callback.currency.clone(),
            success: callback.success,
            merchant_order_id: callback.order.merchant_order_id.clone(),
            raw_snapshot: Value::Object(obj.clone()),
            processed_at,
        }
    }
}
