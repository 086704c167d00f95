//! Billing handlers.
//!
//! ## Commands
//! - Processing payment processor transaction callbacks

mod handle_transaction_webhook;

pub use handle_transaction_webhook::{
    HandleTransactionWebhookCommand, HandleTransactionWebhookHandler, WebhookOutcome,
};
