//! WebSocket adapters for real-time subscriber notifications.
//!
//! # Architecture
//!
//! ```text
//! HandleTransactionWebhookHandler
//!          │ publish(subscriber, message)   (after commit)
//!          ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  NotificationGateway                      │
//! │   u1: conn-a, conn-b        u2: conn-d                    │
//! └──────────────────────────────────────────────────────────┘
//!          │ bounded queue per connection
//!          ▼
//!     socket task (handler)  ──►  client
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`gateway`] - Connection registry and fanout
//! - [`handler`] - Authenticated axum upgrade handler

pub mod gateway;
pub mod handler;
pub mod messages;

pub use gateway::{ConnectionHandle, NotificationGateway, OutboundFrame};
pub use handler::{websocket_router, ws_handler, HandshakeQuery, WebSocketState};
pub use messages::{
    ClientMessage, ConnectedMessage, ErrorMessage, NotificationEvent, PongMessage, ServerMessage,
};
