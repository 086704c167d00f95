//! Connection registry and notification fanout.
//!
//! Connections are grouped by the subscriber they authenticated as:
//!
//! ```text
//! subscriber: u1         subscriber: u2
//! ├── conn-a             └── conn-d
//! └── conn-b
//! ```
//!
//! Publishing to u1 reaches conn-a and conn-b only. Every connection owns a
//! bounded queue drained by its socket task; publish uses `try_send`, so a
//! slow client loses messages instead of stalling the publisher.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::domain::billing::NotificationMessage;
use crate::domain::foundation::{ConnectionId, SubscriberId, Timestamp};
use crate::ports::{DeliveryReport, NotificationError, NotificationPublisher};

use super::messages::{NotificationEvent, ServerMessage};

/// Serialized frame shared by every recipient connection.
pub type OutboundFrame = Arc<str>;

/// A registered connection, handed to the socket task that serves it.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub subscriber_id: SubscriberId,
    pub authenticated_at: Timestamp,
    pub frames: mpsc::Receiver<OutboundFrame>,
}

type Registry = HashMap<SubscriberId, HashMap<ConnectionId, mpsc::Sender<OutboundFrame>>>;

/// Registry of live notification connections.
///
/// # Thread Safety
///
/// Uses `RwLock`: publishes (reads) vastly outnumber connects and
/// disconnects (writes), and publishes to different subscribers run
/// concurrently. Empty subscriber entries are removed on disconnect.
pub struct NotificationGateway {
    connections: RwLock<Registry>,
    buffer: usize,
}

impl NotificationGateway {
    /// Create a gateway whose connections each buffer `buffer` frames.
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Create with default capacity (32 frames per connection).
    pub fn with_default_capacity() -> Self {
        Self::new(32)
    }

    /// Bind a new connection to `subscriber_id`.
    pub async fn register(&self, subscriber_id: SubscriberId) -> ConnectionHandle {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = ConnectionId::new();

        self.connections
            .write()
            .await
            .entry(subscriber_id.clone())
            .or_default()
            .insert(id, tx);

        tracing::debug!(subscriber_id = %subscriber_id, connection_id = %id, "Connection registered");

        ConnectionHandle {
            id,
            subscriber_id,
            authenticated_at: Timestamp::now(),
            frames: rx,
        }
    }

    /// Remove a connection. Unknown ids are ignored.
    pub async fn unregister(&self, subscriber_id: &SubscriberId, connection_id: &ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(entries) = connections.get_mut(subscriber_id) {
            entries.remove(connection_id);
            if entries.is_empty() {
                connections.remove(subscriber_id);
            }
        }
        tracing::debug!(subscriber_id = %subscriber_id, connection_id = %connection_id, "Connection removed");
    }

    /// Live connections of one subscriber.
    pub async fn connection_count(&self, subscriber_id: &SubscriberId) -> usize {
        self.connections
            .read()
            .await
            .get(subscriber_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Live connections across all subscribers.
    pub async fn total_connection_count(&self) -> usize {
        self.connections.read().await.values().map(HashMap::len).sum()
    }
}

impl Default for NotificationGateway {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl NotificationPublisher for NotificationGateway {
    async fn publish(
        &self,
        recipient: &SubscriberId,
        message: NotificationMessage,
    ) -> Result<DeliveryReport, NotificationError> {
        let connections = self.connections.read().await;
        let Some(entries) = connections.get(recipient) else {
            return Ok(DeliveryReport::default());
        };

        let frame = serde_json::to_string(&ServerMessage::Notification(NotificationEvent::from(
            &message,
        )))
        .map_err(|e| NotificationError::Serialization(e.to_string()))?;
        let frame: OutboundFrame = Arc::from(frame);

        let mut report = DeliveryReport::default();
        for (connection_id, sender) in entries {
            match sender.try_send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(connection_id = %connection_id, "Connection queue full, notification dropped");
                    report.dropped += 1;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(connection_id = %connection_id, "Connection closing, notification dropped");
                    report.dropped += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn subscriber(id: &str) -> SubscriberId {
        SubscriberId::new(id).unwrap()
    }

    fn message(to: &str) -> NotificationMessage {
        NotificationMessage::new(subscriber(to), "Subscription activated", "Your plan is active.")
    }

    #[tokio::test]
    async fn publish_without_connections_is_noop() {
        let gateway = NotificationGateway::default();

        let report = gateway.publish(&subscriber("u1"), message("u1")).await.unwrap();

        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn publish_reaches_every_connection_of_subscriber_only() {
        let gateway = NotificationGateway::default();
        let mut a = gateway.register(subscriber("u1")).await;
        let mut b = gateway.register(subscriber("u1")).await;
        let mut other = gateway.register(subscriber("u2")).await;

        let report = gateway.publish(&subscriber("u1"), message("u1")).await.unwrap();

        assert_eq!(report.delivered, 2);
        for handle in [&mut a, &mut b] {
            let frame = handle.frames.try_recv().unwrap();
            let value: Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(value["event"], "notifications:u1");
            assert_eq!(value["title"], "Subscription activated");
        }
        assert!(other.frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_removes_connection_and_empty_entry() {
        let gateway = NotificationGateway::default();
        let handle = gateway.register(subscriber("u1")).await;
        assert_eq!(gateway.connection_count(&subscriber("u1")).await, 1);

        gateway.unregister(&handle.subscriber_id, &handle.id).await;

        assert_eq!(gateway.connection_count(&subscriber("u1")).await, 0);
        assert_eq!(gateway.total_connection_count().await, 0);
        assert!(gateway
            .publish(&subscriber("u1"), message("u1"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let gateway = NotificationGateway::new(1);
        let mut handle = gateway.register(subscriber("u1")).await;

        let first = gateway.publish(&subscriber("u1"), message("u1")).await.unwrap();
        let second = gateway.publish(&subscriber("u1"), message("u1")).await.unwrap();

        assert_eq!(first.delivered, 1);
        assert_eq!(second.dropped, 1);
        assert!(handle.frames.try_recv().is_ok());
        assert!(handle.frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_receiver_counts_as_dropped() {
        let gateway = NotificationGateway::default();
        let handle = gateway.register(subscriber("u1")).await;
        drop(handle.frames);

        let report = gateway.publish(&subscriber("u1"), message("u1")).await.unwrap();

        assert_eq!(report.dropped, 1);
        assert_eq!(report.delivered, 0);
    }

    #[tokio::test]
    async fn concurrent_connects_and_publishes_keep_registry_consistent() {
        let gateway = Arc::new(NotificationGateway::new(256));
        let mut tasks = Vec::new();

        for i in 0..16 {
            let gateway = gateway.clone();
            tasks.push(tokio::spawn(async move {
                let handle = gateway.register(subscriber("u1")).await;
                gateway.publish(&subscriber("u1"), message("u1")).await.unwrap();
                if i % 2 == 0 {
                    gateway.unregister(&handle.subscriber_id, &handle.id).await;
                }
                handle
            }));
        }

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        assert_eq!(gateway.connection_count(&subscriber("u1")).await, 8);
        drop(handles);
    }
}
