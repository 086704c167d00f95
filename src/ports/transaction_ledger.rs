//! TransactionLedger port - Idempotency guard for processor transactions.
//!
//! The processor delivers callbacks at least once, sometimes concurrently.
//! This port turns that into exactly-once effects: the first caller for a
//! transaction id inserts the record and applies the plan activation in the
//! same atomic unit; every later caller observes `AlreadyProcessed`.
//!
//! ## Atomicity
//!
//! Implementations MUST insert the record and write the subscription in one
//! transaction (both commit or both roll back). The uniqueness of
//! `external_id` at the storage layer is the only synchronization primitive.

use async_trait::async_trait;

use crate::domain::billing::{ActivationOutcome, PlanActivation, Subscription, TransactionRecord};
use crate::domain::foundation::{DomainError, SubscriberId, TransactionId};

/// Result of attempting to record a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Record was inserted (first time seeing this transaction).
    ///
    /// `activation` is `None` when no activation was requested.
    Inserted {
        activation: Option<ActivationOutcome>,
    },

    /// Record already exists; all effects happened on an earlier delivery.
    AlreadyProcessed,
}

impl RecordOutcome {
    /// The subscription written by this call, if any.
    pub fn activated_subscription(&self) -> Option<&Subscription> {
        match self {
            RecordOutcome::Inserted {
                activation: Some(outcome),
            } if outcome.changed() => Some(outcome.subscription()),
            _ => None,
        }
    }
}

/// Port for the transaction ledger and the subscription rows it guards.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Inserts `record` if its `external_id` is new and, in the same atomic
    /// unit, applies `activation` through the monotonic policy.
    ///
    /// # Errors
    ///
    /// Any storage failure rolls back both writes and returns
    /// `ErrorCode::DatabaseError`; the caller should answer with a retryable
    /// failure.
    async fn record_if_absent(
        &self,
        record: TransactionRecord,
        activation: Option<PlanActivation>,
    ) -> Result<RecordOutcome, DomainError>;

    /// Find a recorded transaction by processor id.
    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, DomainError>;

    /// Find the current subscription of a subscriber.
    async fn find_subscription(
        &self,
        subscriber_id: &SubscriberId,
    ) -> Result<Option<Subscription>, DomainError>;
}
