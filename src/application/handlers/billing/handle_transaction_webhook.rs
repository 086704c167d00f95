//! HandleTransactionWebhookHandler - Command handler for processor transaction callbacks.
//!
//! Pipeline, in order:
//!
//! ```text
//! Received → Verified → Parsed → Recorded ─┬─ AlreadyProcessed ───────────┐
//!                                          └─ Inserted → Activated → Notified → Acknowledged
//! ```
//!
//! Signature and parse failures reject before any write. Ledger failures
//! (including the processing timeout) are retryable. Notification runs only
//! after the ledger transaction committed and never fails the callback.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::billing::{
    NotificationMessage, OrderIdentifier, PlanActivation, SignatureVerifier, Subscription,
    TransactionCallback, TransactionRecord, WebhookEnvelope, WebhookError,
};
use crate::domain::foundation::{Timestamp, TransactionId};
use crate::ports::{NotificationPublisher, RecordOutcome, TransactionLedger};

/// Command to handle a processor callback.
#[derive(Debug, Clone)]
pub struct HandleTransactionWebhookCommand {
    /// Raw request body.
    pub body: Vec<u8>,
    /// Signature passed as `?hmac=` when the body carries none.
    pub query_hmac: Option<String>,
}

/// Result of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// First delivery of this transaction; effects applied.
    Processed,
    /// Transaction already recorded; nothing changed.
    AlreadyProcessed,
    /// Envelope type not handled; acknowledged without processing.
    Ignored,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Processed => "processed",
            WebhookOutcome::AlreadyProcessed => "already_processed",
            WebhookOutcome::Ignored => "ignored",
        }
    }
}

/// Handler for processor transaction callbacks.
pub struct HandleTransactionWebhookHandler {
    verifier: Arc<SignatureVerifier>,
    ledger: Arc<dyn TransactionLedger>,
    publisher: Arc<dyn NotificationPublisher>,
    processing_timeout: Duration,
}

impl HandleTransactionWebhookHandler {
    pub fn new(
        verifier: Arc<SignatureVerifier>,
        ledger: Arc<dyn TransactionLedger>,
        publisher: Arc<dyn NotificationPublisher>,
        processing_timeout: Duration,
    ) -> Self {
        Self {
            verifier,
            ledger,
            publisher,
            processing_timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleTransactionWebhookCommand,
    ) -> Result<WebhookOutcome, WebhookError> {
        // 1. Structural validation (not the trust boundary)
        let envelope = WebhookEnvelope::parse(&cmd.body)?;
        if !envelope.is_transaction() {
            tracing::debug!(event_type = %envelope.event_type, "Ignoring non-transaction callback");
            return Ok(WebhookOutcome::Ignored);
        }

        // 2. Verify signature
        let signature = envelope
            .signature(cmd.query_hmac.as_deref())
            .ok_or_else(|| WebhookError::MalformedEnvelope("missing hmac".to_string()))?;
        self.verifier.verify(&envelope.obj, signature).map_err(|e| {
            tracing::warn!(error = %e, "Rejected callback with invalid signature");
            WebhookError::from(e)
        })?;

        // 3. Parse business context
        let callback = TransactionCallback::from_obj(&envelope.obj)?;
        let order = OrderIdentifier::decode(&callback.order.merchant_order_id).map_err(|e| {
            tracing::warn!(
                transaction_id = callback.id,
                error = %e,
                "Rejected callback with invalid order identifier"
            );
            WebhookError::from(e)
        })?;

        let record = TransactionRecord::from_callback(&callback, &envelope.obj, Timestamp::now());
        let activation = callback.is_settled().then(|| PlanActivation {
            subscriber_id: order.subscriber_id.clone(),
            plan_tier: order.plan_tier,
            transaction_id: TransactionId::new(callback.id),
        });

        // 4. Record + activate atomically
        let outcome = self.record(record, activation).await?;

        match &outcome {
            RecordOutcome::AlreadyProcessed => {
                tracing::info!(transaction_id = callback.id, "Duplicate callback acknowledged");
                return Ok(WebhookOutcome::AlreadyProcessed);
            }
            RecordOutcome::Inserted { activation: None } => {
                tracing::info!(
                    transaction_id = callback.id,
                    success = callback.success,
                    pending = callback.pending,
                    "Recorded unsettled transaction"
                );
            }
            RecordOutcome::Inserted {
                activation: Some(activation),
            } => {
                tracing::info!(
                    transaction_id = callback.id,
                    subscriber_id = %order.subscriber_id,
                    plan_tier = order.plan_tier.as_str(),
                    changed = activation.changed(),
                    "Recorded transaction"
                );
            }
        }

        // 5. Notify (post-commit, best effort)
        if let Some(subscription) = outcome.activated_subscription() {
            self.notify(subscription).await;
        }

        Ok(WebhookOutcome::Processed)
    }

    async fn record(
        &self,
        record: TransactionRecord,
        activation: Option<PlanActivation>,
    ) -> Result<RecordOutcome, WebhookError> {
        let transaction_id = record.external_id;
        match tokio::time::timeout(
            self.processing_timeout,
            self.ledger.record_if_absent(record, activation),
        )
        .await
        {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(e)) => {
                tracing::error!(%transaction_id, error = %e, "Ledger write failed, rolled back");
                Err(WebhookError::Persistence(e.to_string()))
            }
            Err(_) => {
                tracing::error!(%transaction_id, "Ledger write timed out");
                Err(WebhookError::Timeout)
            }
        }
    }

    async fn notify(&self, subscription: &Subscription) {
        let message = NotificationMessage::plan_activated(subscription);
        match self
            .publisher
            .publish(&subscription.subscriber_id, message)
            .await
        {
            Ok(report) if report.is_empty() => {
                tracing::debug!(
                    subscriber_id = %subscription.subscriber_id,
                    "Subscriber not connected, notification skipped"
                );
            }
            Ok(report) => {
                tracing::debug!(
                    subscriber_id = %subscription.subscriber_id,
                    delivered = report.delivered,
                    dropped = report.dropped,
                    "Notification published"
                );
            }
            Err(e) => {
                tracing::warn!(
                    subscriber_id = %subscription.subscriber_id,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ledger::InMemoryTransactionLedger;
    use crate::domain::billing::signature::fixtures::{transaction_obj, DIGEST, SECRET};
    use crate::domain::billing::{PlanTier, SignatureError};
    use crate::domain::foundation::{DomainError, SubscriberId};
    use crate::ports::{DeliveryReport, NotificationError};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<NotificationMessage>>,
        fail: bool,
    }

    impl RecordingPublisher {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn published(&self) -> Vec<NotificationMessage> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationPublisher for RecordingPublisher {
        async fn publish(
            &self,
            _recipient: &SubscriberId,
            message: NotificationMessage,
        ) -> Result<DeliveryReport, NotificationError> {
            if self.fail {
                return Err(NotificationError::Unavailable("socket layer down".into()));
            }
            self.published.lock().unwrap().push(message);
            Ok(DeliveryReport {
                delivered: 1,
                dropped: 0,
            })
        }
    }

    /// Ledger that never answers within any reasonable bound.
    struct StalledLedger;

    #[async_trait]
    impl TransactionLedger for StalledLedger {
        async fn record_if_absent(
            &self,
            _record: TransactionRecord,
            _activation: Option<PlanActivation>,
        ) -> Result<RecordOutcome, DomainError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(RecordOutcome::AlreadyProcessed)
        }

        async fn find_transaction(
            &self,
            _id: TransactionId,
        ) -> Result<Option<TransactionRecord>, DomainError> {
            Ok(None)
        }

        async fn find_subscription(
            &self,
            _subscriber_id: &SubscriberId,
        ) -> Result<Option<Subscription>, DomainError> {
            Ok(None)
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn verifier() -> Arc<SignatureVerifier> {
        Arc::new(SignatureVerifier::new(SecretString::new(SECRET.to_string())))
    }

    fn handler_with(
        ledger: Arc<dyn TransactionLedger>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> HandleTransactionWebhookHandler {
        HandleTransactionWebhookHandler::new(verifier(), ledger, publisher, Duration::from_secs(5))
    }

    fn command_for(obj: Map<String, Value>) -> HandleTransactionWebhookCommand {
        let hmac = verifier().sign(&obj).unwrap();
        let body = json!({"type": "TRANSACTION", "obj": obj, "hmac": hmac});
        HandleTransactionWebhookCommand {
            body: serde_json::to_vec(&body).unwrap(),
            query_hmac: None,
        }
    }

    fn fixture_command() -> HandleTransactionWebhookCommand {
        let body = json!({"type": "TRANSACTION", "obj": transaction_obj(), "hmac": DIGEST});
        HandleTransactionWebhookCommand {
            body: serde_json::to_vec(&body).unwrap(),
            query_hmac: None,
        }
    }

    fn subscriber() -> SubscriberId {
        SubscriberId::new("64f1a2b3c4d5e6f7g8h9i0j1").unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn valid_callback_activates_and_notifies() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = handler_with(ledger.clone(), publisher.clone());

        let outcome = handler.handle(fixture_command()).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        let subscription = ledger.find_subscription(&subscriber()).await.unwrap().unwrap();
        assert_eq!(subscription.plan_tier, PlanTier::Professional);
        assert_eq!(subscription.source_transaction_id, TransactionId::new(192036465));
        assert_eq!(publisher.published().len(), 1);
        assert_eq!(publisher.published()[0].recipient_id, subscriber());
    }

    #[tokio::test]
    async fn redelivery_is_acknowledged_without_effects() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = handler_with(ledger.clone(), publisher.clone());

        handler.handle(fixture_command()).await.unwrap();
        let second = handler.handle(fixture_command()).await.unwrap();

        assert_eq!(second, WebhookOutcome::AlreadyProcessed);
        assert_eq!(ledger.transaction_count().await, 1);
        assert_eq!(publisher.published().len(), 1);
    }

    #[tokio::test]
    async fn query_hmac_is_accepted() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let handler = handler_with(ledger.clone(), Arc::new(RecordingPublisher::default()));
        let body = json!({"type": "TRANSACTION", "obj": transaction_obj()});

        let outcome = handler
            .handle(HandleTransactionWebhookCommand {
                body: serde_json::to_vec(&body).unwrap(),
                query_hmac: Some(DIGEST.to_string()),
            })
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
    }

    #[tokio::test]
    async fn missing_hmac_is_malformed() {
        let handler = handler_with(
            Arc::new(InMemoryTransactionLedger::new()),
            Arc::new(RecordingPublisher::default()),
        );
        let body = json!({"type": "TRANSACTION", "obj": transaction_obj()});

        let err = handler
            .handle(HandleTransactionWebhookCommand {
                body: serde_json::to_vec(&body).unwrap(),
                query_hmac: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::MalformedEnvelope(_)));
    }

    #[tokio::test]
    async fn tampered_callback_is_rejected_without_writes() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let handler = handler_with(ledger.clone(), Arc::new(RecordingPublisher::default()));
        let mut obj = transaction_obj();
        obj.insert("amount_cents".to_string(), json!(1));
        let body = json!({"type": "TRANSACTION", "obj": obj, "hmac": DIGEST});

        let err = handler
            .handle(HandleTransactionWebhookCommand {
                body: serde_json::to_vec(&body).unwrap(),
                query_hmac: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::InvalidSignature(SignatureError::Mismatch)));
        assert_eq!(ledger.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn malformed_order_identifier_is_rejected_without_writes() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let handler = handler_with(ledger.clone(), Arc::new(RecordingPublisher::default()));
        let mut obj = transaction_obj();
        obj.insert(
            "order".to_string(),
            json!({"id": 217503754, "merchant_order_id": "u1---SUBSCRIPTION---professional"}),
        );

        let err = handler.handle(command_for(obj)).await.unwrap_err();

        assert!(matches!(err, WebhookError::InvalidOrderIdentifier(_)));
        assert_eq!(ledger.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn failed_payment_is_recorded_but_not_activated() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = handler_with(ledger.clone(), publisher.clone());
        let mut obj = transaction_obj();
        obj.insert("success".to_string(), json!(false));

        let outcome = handler.handle(command_for(obj)).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        assert_eq!(ledger.transaction_count().await, 1);
        assert!(ledger.find_subscription(&subscriber()).await.unwrap().is_none());
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn downgrade_attempt_records_without_notification() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        ledger
            .insert_subscription(Subscription {
                subscriber_id: subscriber(),
                plan_tier: PlanTier::Enterprise,
                activated_at: Timestamp::now(),
                source_transaction_id: TransactionId::new(1),
            })
            .await;
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = handler_with(ledger.clone(), publisher.clone());

        let outcome = handler.handle(fixture_command()).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        let stored = ledger.find_subscription(&subscriber()).await.unwrap().unwrap();
        assert_eq!(stored.plan_tier, PlanTier::Enterprise);
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn ledger_failure_is_retryable() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        ledger.set_unavailable(true);
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = handler_with(ledger.clone(), publisher.clone());

        let err = handler.handle(fixture_command()).await.unwrap_err();

        assert!(matches!(err, WebhookError::Persistence(_)));
        assert!(err.is_retryable());
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn retry_after_ledger_recovers_processes_once() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let handler = handler_with(ledger.clone(), Arc::new(RecordingPublisher::default()));

        ledger.set_unavailable(true);
        assert!(handler.handle(fixture_command()).await.is_err());
        ledger.set_unavailable(false);

        assert_eq!(
            handler.handle(fixture_command()).await.unwrap(),
            WebhookOutcome::Processed
        );
        assert_eq!(
            handler.handle(fixture_command()).await.unwrap(),
            WebhookOutcome::AlreadyProcessed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_ledger_times_out() {
        let handler = HandleTransactionWebhookHandler::new(
            verifier(),
            Arc::new(StalledLedger),
            Arc::new(RecordingPublisher::default()),
            Duration::from_secs(2),
        );

        let err = handler.handle(fixture_command()).await.unwrap_err();

        assert!(matches!(err, WebhookError::Timeout));
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_callback() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let handler = handler_with(ledger.clone(), Arc::new(RecordingPublisher::failing()));

        let outcome = handler.handle(fixture_command()).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        assert!(ledger.find_subscription(&subscriber()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn non_transaction_type_is_ignored() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let handler = handler_with(ledger.clone(), Arc::new(RecordingPublisher::default()));
        let body = json!({"type": "TOKEN", "obj": {"token": "abc"}});

        let outcome = handler
            .handle(HandleTransactionWebhookCommand {
                body: serde_json::to_vec(&body).unwrap(),
                query_hmac: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
        assert_eq!(ledger.transaction_count().await, 0);
    }
}
