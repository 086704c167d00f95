//! HTTP adapters - axum endpoints and the application router.

pub mod router;
pub mod webhook;

pub use router::{build_app, health};
pub use webhook::{webhook_router, WebhookAck, WebhookAppState};
