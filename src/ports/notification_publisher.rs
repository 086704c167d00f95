//! NotificationPublisher port - Best-effort push to live subscriber connections.
//!
//! Delivery is fire-and-forget: callers log failures and move on. There is no
//! retry and no queueing for subscribers who are not connected.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::billing::NotificationMessage;
use crate::domain::foundation::SubscriberId;

/// Counts from a single publish call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections the message was queued for.
    pub delivered: usize,

    /// Connections skipped because their queue was full or closed.
    pub dropped: usize,
}

impl DeliveryReport {
    /// True when no live connection existed for the recipient.
    pub fn is_empty(&self) -> bool {
        self.delivered == 0 && self.dropped == 0
    }
}

/// Errors from the notification transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("Failed to serialize notification: {0}")]
    Serialization(String),

    #[error("Notification transport unavailable: {0}")]
    Unavailable(String),
}

/// Port for pushing notifications to a subscriber's live connections.
///
/// # Contract
///
/// - No live connections is `Ok` with an empty report, never an error
/// - Must not block on slow consumers
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(
        &self,
        recipient: &SubscriberId,
        message: NotificationMessage,
    ) -> Result<DeliveryReport, NotificationError>;
}
