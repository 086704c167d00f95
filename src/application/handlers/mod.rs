//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod billing;

pub use billing::{HandleTransactionWebhookCommand, HandleTransactionWebhookHandler, WebhookOutcome};
