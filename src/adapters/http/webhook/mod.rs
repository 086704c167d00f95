//! HTTP adapter for processor callbacks.
//!
//! - `POST /api/webhooks/transactions` - Transaction callback

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, HmacQuery, WebhookAck};
pub use handlers::{handle_transaction_webhook, WebhookApiError, WebhookAppState};
pub use routes::webhook_router;
