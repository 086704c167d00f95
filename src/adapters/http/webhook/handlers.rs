//! HTTP handler for processor transaction callbacks.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{HandleTransactionWebhookCommand, HandleTransactionWebhookHandler};
use crate::domain::billing::WebhookError;

use super::dto::{ErrorResponse, HmacQuery, WebhookAck};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the callback endpoint.
#[derive(Clone)]
pub struct WebhookAppState {
    pub handler: Arc<HandleTransactionWebhookHandler>,
}

impl WebhookAppState {
    pub fn new(handler: Arc<HandleTransactionWebhookHandler>) -> Self {
        Self { handler }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/transactions - Handle a processor transaction callback
///
/// The body is taken as raw bytes; it is parsed and verified by the
/// application handler, never by an extractor.
pub async fn handle_transaction_webhook(
    State(state): State<WebhookAppState>,
    Query(query): Query<HmacQuery>,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookApiError> {
    let cmd = HandleTransactionWebhookCommand {
        body: body.to_vec(),
        query_hmac: query.hmac,
    };

    let outcome = state.handler.handle(cmd).await?;

    Ok(Json(WebhookAck::from(outcome)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Callback processing failed");
        }

        // Internal details stay in the log.
        let message = match &self.0 {
            WebhookError::Persistence(_) | WebhookError::Internal(_) => {
                "Callback could not be processed; retry later".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(self.0.code(), message))).into_response()
    }
}
