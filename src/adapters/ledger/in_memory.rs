//! In-memory transaction ledger implementation.
//!
//! This adapter provides an in-memory implementation of the `TransactionLedger`
//! port. Useful for:
//! - Development without a database
//! - Handler and HTTP integration tests
//!
//! The check-insert-activate sequence runs under one async mutex, which gives
//! the same exactly-once guarantee the PostgreSQL primary key gives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::billing::{
    PlanActivation, Subscription, SubscriptionActivator, TransactionRecord,
};
use crate::domain::foundation::{DomainError, SubscriberId, Timestamp, TransactionId};
use crate::ports::{RecordOutcome, TransactionLedger};

#[derive(Default)]
struct LedgerState {
    transactions: HashMap<TransactionId, TransactionRecord>,
    subscriptions: HashMap<SubscriberId, Subscription>,
}

/// In-memory implementation of the TransactionLedger port.
///
/// Does not persist data across restarts.
#[derive(Default)]
pub struct InMemoryTransactionLedger {
    state: Mutex<LedgerState>,
    unavailable: AtomicBool,
}

impl InMemoryTransactionLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with a database error, as if storage were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Seeds a subscription, bypassing the ledger.
    pub async fn insert_subscription(&self, subscription: Subscription) {
        self.state
            .lock()
            .await
            .subscriptions
            .insert(subscription.subscriber_id.clone(), subscription);
    }

    /// Number of recorded transactions.
    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::database("ledger unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionLedger for InMemoryTransactionLedger {
    async fn record_if_absent(
        &self,
        record: TransactionRecord,
        activation: Option<PlanActivation>,
    ) -> Result<RecordOutcome, DomainError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        if state.transactions.contains_key(&record.external_id) {
            return Ok(RecordOutcome::AlreadyProcessed);
        }

        let outcome = activation.map(|activation| {
            let current = state.subscriptions.get(&activation.subscriber_id);
            SubscriptionActivator::activate(current, &activation, Timestamp::now())
        });

        if let Some(outcome) = outcome.as_ref().filter(|o| o.changed()) {
            let subscription = outcome.subscription().clone();
            state
                .subscriptions
                .insert(subscription.subscriber_id.clone(), subscription);
        }
        state.transactions.insert(record.external_id, record);

        Ok(RecordOutcome::Inserted {
            activation: outcome,
        })
    }

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, DomainError> {
        self.check_available()?;
        Ok(self.state.lock().await.transactions.get(&id).cloned())
    }

    async fn find_subscription(
        &self,
        subscriber_id: &SubscriberId,
    ) -> Result<Option<Subscription>, DomainError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .subscriptions
            .get(subscriber_id)
            .cloned())
    }
}
