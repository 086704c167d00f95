//! Real-time notification payload.

use serde::Serialize;

use crate::domain::foundation::{SubscriberId, Timestamp};

use super::subscription::Subscription;

/// Message pushed to a subscriber's live connections.
///
/// Ephemeral: durable notification history is not kept here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    pub recipient_id: SubscriberId,
    pub title: String,
    pub message: String,
    pub created_at: Timestamp,
}

impl NotificationMessage {
    pub fn new(
        recipient_id: SubscriberId,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id,
            title: title.into(),
            message: message.into(),
            created_at: Timestamp::now(),
        }
    }

    /// Notification sent after a successful plan activation.
    pub fn plan_activated(subscription: &Subscription) -> Self {
        Self::new(
            subscription.subscriber_id.clone(),
            "Subscription activated",
            format!(
                "Your {} plan is now active.",
                subscription.plan_tier.display_name()
            ),
        )
    }

    /// Per-subscriber event name on the real-time channel.
    pub fn event_name(&self) -> String {
        format!("notifications:{}", self.recipient_id)
    }
}
