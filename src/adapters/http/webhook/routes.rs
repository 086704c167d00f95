//! Axum router configuration for processor callbacks.

use axum::{routing::post, Router};

use super::handlers::{handle_transaction_webhook, WebhookAppState};

/// Create the callback router, mounted under `/api`.
///
/// # Routes
/// - `POST /webhooks/transactions` - Processor transaction callback (no auth, HMAC verified)
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new().route("/webhooks/transactions", post(handle_transaction_webhook))
}
