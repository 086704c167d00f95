//! PostgreSQL ledger tests against a live database.
//!
//! Ignored by default. Run with:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/paywire_test cargo test --test postgres_ledger_integration -- --ignored
//! ```

use std::sync::Arc;

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use paywire::adapters::postgres::PostgresTransactionLedger;
use paywire::domain::billing::{PlanActivation, PlanTier, TransactionRecord};
use paywire::domain::foundation::{SubscriberId, Timestamp, TransactionId};
use paywire::ports::{RecordOutcome, TransactionLedger};

async fn ledger() -> Arc<PostgresTransactionLedger> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
    let pool = PgPool::connect(&url).await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Arc::new(PostgresTransactionLedger::new(pool))
}

/// Fresh ids per run so tests can share one database.
fn unique_transaction_id() -> TransactionId {
    let low = Uuid::new_v4().as_u128() as i64;
    TransactionId::new(low.rem_euclid(i64::MAX / 2) + 1)
}

fn unique_subscriber() -> SubscriberId {
    SubscriberId::new(format!("sub_{}", Uuid::new_v4().simple())).unwrap()
}

fn record(id: TransactionId, subscriber: &SubscriberId, tier: PlanTier) -> TransactionRecord {
    TransactionRecord {
        external_id: id,
        amount_cents: 20000,
        currency: "EGP".to_string(),
        success: true,
        merchant_order_id: format!("{}---SUBSCRIPTION---{}---1700000000000", subscriber, tier.as_str()),
        raw_snapshot: json!({ "id": id.as_i64() }),
        processed_at: Timestamp::now(),
    }
}

fn activation(id: TransactionId, subscriber: &SubscriberId, tier: PlanTier) -> PlanActivation {
    PlanActivation {
        subscriber_id: subscriber.clone(),
        plan_tier: tier,
        transaction_id: id,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn redelivery_is_already_processed_and_leaves_subscription_alone() {
    let ledger = ledger().await;
    let subscriber = unique_subscriber();
    let id = unique_transaction_id();

    let first = ledger
        .record_if_absent(
            record(id, &subscriber, PlanTier::Professional),
            Some(activation(id, &subscriber, PlanTier::Professional)),
        )
        .await
        .unwrap();
    let second = ledger
        .record_if_absent(
            record(id, &subscriber, PlanTier::Professional),
            Some(activation(id, &subscriber, PlanTier::Professional)),
        )
        .await
        .unwrap();

    assert!(first.activated_subscription().is_some());
    assert!(matches!(second, RecordOutcome::AlreadyProcessed));

    let subscription = ledger.find_subscription(&subscriber).await.unwrap().unwrap();
    assert_eq!(subscription.plan_tier, PlanTier::Professional);
    assert_eq!(subscription.source_transaction_id, id);
    assert!(ledger.find_transaction(id).await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_duplicates_insert_exactly_once() {
    let ledger = ledger().await;
    let subscriber = unique_subscriber();
    let id = unique_transaction_id();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let ledger = ledger.clone();
        let subscriber = subscriber.clone();
        tasks.push(tokio::spawn(async move {
            ledger
                .record_if_absent(
                    record(id, &subscriber, PlanTier::Starter),
                    Some(activation(id, &subscriber, PlanTier::Starter)),
                )
                .await
                .unwrap()
        }));
    }

    let mut inserted = 0;
    for task in tasks {
        if matches!(task.await.unwrap(), RecordOutcome::Inserted { .. }) {
            inserted += 1;
        }
    }

    assert_eq!(inserted, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn racing_first_activations_keep_the_higher_tier() {
    let ledger = ledger().await;
    let subscriber = unique_subscriber();
    let high = unique_transaction_id();
    let low = unique_transaction_id();

    let (a, b) = tokio::join!(
        ledger.record_if_absent(
            record(high, &subscriber, PlanTier::Enterprise),
            Some(activation(high, &subscriber, PlanTier::Enterprise)),
        ),
        ledger.record_if_absent(
            record(low, &subscriber, PlanTier::Starter),
            Some(activation(low, &subscriber, PlanTier::Starter)),
        ),
    );
    a.unwrap();
    b.unwrap();

    let subscription = ledger.find_subscription(&subscriber).await.unwrap().unwrap();
    assert_eq!(subscription.plan_tier, PlanTier::Enterprise);
    assert_eq!(subscription.source_transaction_id, high);
    assert!(ledger.find_transaction(low).await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn unsettled_transaction_is_recorded_without_subscription() {
    let ledger = ledger().await;
    let subscriber = unique_subscriber();
    let id = unique_transaction_id();

    let outcome = ledger
        .record_if_absent(record(id, &subscriber, PlanTier::Starter), None)
        .await
        .unwrap();

    assert!(matches!(outcome, RecordOutcome::Inserted { activation: None }));
    assert!(ledger.find_subscription(&subscriber).await.unwrap().is_none());
}
