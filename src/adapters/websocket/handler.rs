//! WebSocket upgrade handler for subscriber notification connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Validate the bearer credential (header or `?token=`)
//! 2. Upgrade to WebSocket
//! 3. Register the connection under the authenticated subscriber
//! 4. Forward notifications and answer pings until disconnect or expiry
//! 5. Unregister the connection

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::domain::foundation::{AuthError, AuthenticatedSubscriber, Timestamp};
use crate::ports::SessionValidator;

use super::gateway::NotificationGateway;
use super::messages::{ClientMessage, ConnectedMessage, ErrorMessage, PongMessage, ServerMessage};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub gateway: Arc<NotificationGateway>,
    pub validator: Arc<dyn SessionValidator>,
}

impl WebSocketState {
    pub fn new(gateway: Arc<NotificationGateway>, validator: Arc<dyn SessionValidator>) -> Self {
        Self { gateway, validator }
    }
}

/// Query parameters accepted at the handshake.
#[derive(Debug, Default, Deserialize)]
pub struct HandshakeQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Handle WebSocket upgrade requests for notifications.
///
/// Route: `GET /api/notifications/ws`
///
/// The credential is checked before the upgrade, so unauthenticated clients
/// get a plain `401` instead of a socket.
pub async fn ws_handler(
    State(state): State<WebSocketState>,
    Query(query): Query<HandshakeQuery>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(token) = bearer_token(&headers).or(query.token.filter(|t| !t.is_empty())) else {
        return auth_rejection(&AuthError::MissingToken);
    };

    let subscriber = match state.validator.validate(&token).await {
        Ok(subscriber) => subscriber,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected notification handshake");
            return auth_rejection(&e);
        }
    };

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, subscriber, state.gateway)),
        Err(rejection) => rejection.into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn auth_rejection(error: &AuthError) -> Response {
    let (status, code) = match error {
        AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
        AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
        AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
        AuthError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "AUTH_UNAVAILABLE"),
    };
    (status, Json(json!({ "code": code, "message": error.to_string() }))).into_response()
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection; the credential's expiry ends it.
async fn handle_socket(
    socket: WebSocket,
    subscriber: AuthenticatedSubscriber,
    gateway: Arc<NotificationGateway>,
) {
    let mut handle = gateway.register(subscriber.id.clone()).await;
    let (mut sender, mut receiver) = socket.split();

    let connected = ServerMessage::Connected(ConnectedMessage {
        subscriber_id: handle.subscriber_id.to_string(),
        connection_id: handle.id.to_string(),
        timestamp: handle.authenticated_at.to_rfc3339(),
    });

    let remaining_ms = subscriber.expires_at.as_unix_millis() - Timestamp::now().as_unix_millis();
    let expiry = tokio::time::sleep(Duration::from_millis(remaining_ms.max(0) as u64));
    tokio::pin!(expiry);

    if send_message(&mut sender, &connected).await.is_ok() {
        loop {
            tokio::select! {
                frame = handle.frames.recv() => {
                    let Some(frame) = frame else { break };
                    if let Err(e) = sender.send(Message::Text(frame.to_string())).await {
                        tracing::debug!(connection_id = %handle.id, "Send error, closing connection: {}", e);
                        break;
                    }
                }
                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Ping) => ServerMessage::Pong(PongMessage::now()),
                            Err(_) => ServerMessage::Error(ErrorMessage {
                                code: "UNSUPPORTED_MESSAGE".to_string(),
                                message: "Only ping messages are accepted".to_string(),
                                timestamp: Timestamp::now().to_rfc3339(),
                            }),
                        };
                        if send_message(&mut sender, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %handle.id, "Receive error: {}", e);
                        break;
                    }
                },
                _ = &mut expiry => {
                    tracing::debug!(connection_id = %handle.id, "Credential expired, closing connection");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    gateway.unregister(&handle.subscriber_id, &handle.id).await;
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Create axum router for the notification endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/notifications/ws", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(validator: MockSessionValidator) -> axum::Router {
        let state = WebSocketState::new(Arc::new(NotificationGateway::default()), Arc::new(validator));
        websocket_router().with_state(state)
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc".to_string()));

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn handshake_without_token_is_unauthorized() {
        let response = app(MockSessionValidator::new())
            .oneshot(Request::get("/notifications/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn handshake_with_unknown_token_is_unauthorized() {
        let response = app(MockSessionValidator::new())
            .oneshot(
                Request::get("/notifications/ws?token=forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_outage_is_service_unavailable() {
        let validator = MockSessionValidator::new().with_error(AuthError::service_unavailable("down"));
        let response = app(validator)
            .oneshot(
                Request::get("/notifications/ws")
                    .header(AUTHORIZATION, "Bearer anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn valid_token_passes_auth_before_upgrade_check() {
        let validator = MockSessionValidator::new().with_subscriber("t1", "u1");
        let response = app(validator)
            .oneshot(
                Request::get("/notifications/ws")
                    .header(AUTHORIZATION, "Bearer t1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Not a real upgrade request, so the upgrade extractor rejects it.
        assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.status().is_client_error());
    }
}
