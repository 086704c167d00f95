//! Billing domain module.
//!
//! Verifies processor callbacks, decodes order context and decides
//! subscription changes.
//!
//! # Module Structure
//!
//! - `envelope` - Callback envelope and typed transaction view
//! - `signature` - HMAC signature canonicalization and verification
//! - `order_identifier` - Composite merchant order id codec
//! - `tier` - PlanTier ordering
//! - `subscription` - Subscription state and monotonic activation policy
//! - `transaction` - Ledger record
//! - `notification` - Real-time notification payload
//! - `webhook_errors` - Error taxonomy with HTTP mapping

mod envelope;
mod notification;
mod order_identifier;
pub(crate) mod signature;
mod subscription;
mod tier;
mod transaction;
mod webhook_errors;

pub use envelope::{OrderRef, TransactionCallback, WebhookEnvelope, TRANSACTION_EVENT};
pub use notification::NotificationMessage;
pub use order_identifier::{OrderIdentifier, OrderIdentifierError, ProductType, SEPARATOR};
pub use signature::{canonical_string, FieldKind, SignatureError, SignatureVerifier, CANONICAL_FIELDS};
pub use subscription::{ActivationOutcome, PlanActivation, Subscription, SubscriptionActivator};
pub use tier::{PlanTier, UnknownPlanTier};
pub use transaction::TransactionRecord;
pub use webhook_errors::WebhookError;
