//! WebSocket message types for subscriber notifications.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: Connection status, notifications, errors, pongs
//! - Client → Server: Pings

use serde::{Deserialize, Serialize};

use crate::domain::billing::NotificationMessage;
use crate::domain::foundation::Timestamp;

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake accepted and connection registered.
    Connected(ConnectedMessage),

    /// Notification scoped to the connected subscriber.
    Notification(NotificationEvent),

    /// Error occurred.
    Error(ErrorMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

/// Sent once the connection is bound to its subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub subscriber_id: String,
    pub connection_id: String,
    pub timestamp: String,
}

/// Per-subscriber notification event.
///
/// `event` is `notifications:<subscriberId>`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub event: String,
    pub title: String,
    pub message: String,
    pub created_at: String,
}

impl From<&NotificationMessage> for NotificationEvent {
    fn from(message: &NotificationMessage) -> Self {
        Self {
            event: message.event_name(),
            title: message.title.clone(),
            message: message.message.clone(),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Error message sent to client.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

/// Heartbeat response.
#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

impl PongMessage {
    pub fn now() -> Self {
        Self {
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat request.
    Ping,
}
