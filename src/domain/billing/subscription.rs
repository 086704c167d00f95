//! Subscription state and the monotonic activation policy.
//!
//! # Design Decisions
//!
//! - **No downgrade**: a purchased tier below the current one leaves the row untouched
//! - **Renewal**: the same tier refreshes `activated_at` and the source transaction
//! - **Pure policy**: [`SubscriptionActivator`] performs no I/O; ledger adapters
//!   call it inside their atomic section so the decision and the write commit together

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriberId, Timestamp, TransactionId};

use super::tier::PlanTier;

/// A subscriber's current plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscriber_id: SubscriberId,
    pub plan_tier: PlanTier,
    pub activated_at: Timestamp,

    /// Transaction that produced the current state.
    pub source_transaction_id: TransactionId,
}

/// Request to apply a purchased plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanActivation {
    pub subscriber_id: SubscriberId,
    pub plan_tier: PlanTier,
    pub transaction_id: TransactionId,
}

/// Result of applying a [`PlanActivation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The stored subscription was created or replaced with this value.
    Activated(Subscription),

    /// A higher tier was already in place; this value is what stays stored.
    Unchanged(Subscription),
}

impl ActivationOutcome {
    pub fn subscription(&self) -> &Subscription {
        match self {
            ActivationOutcome::Activated(s) | ActivationOutcome::Unchanged(s) => s,
        }
    }

    /// True when the stored row must be written.
    pub fn changed(&self) -> bool {
        matches!(self, ActivationOutcome::Activated(_))
    }
}

/// Monotonic plan upgrade policy.
pub struct SubscriptionActivator;

impl SubscriptionActivator {
    /// Decides the new subscription state for `activation` given the current row.
    pub fn activate(
        current: Option<&Subscription>,
        activation: &PlanActivation,
        now: Timestamp,
    ) -> ActivationOutcome {
        match current {
            Some(existing) if existing.plan_tier.dominates(&activation.plan_tier) => {
                ActivationOutcome::Unchanged(existing.clone())
            }
            _ => ActivationOutcome::Activated(Subscription {
                subscriber_id: activation.subscriber_id.clone(),
                plan_tier: activation.plan_tier,
                activated_at: now,
                source_transaction_id: activation.transaction_id,
            }),
        }
    }
}
