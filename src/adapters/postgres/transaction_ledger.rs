//! PostgreSQL implementation of TransactionLedger.
//!
//! The primary key on `payment_transactions.external_id` is the idempotency
//! guard. The ledger insert and the subscription write share one database
//! transaction:
//!
//! 1. `INSERT ... ON CONFLICT DO NOTHING` the record; zero rows means an
//!    earlier delivery already committed, so roll back and report it.
//! 2. Lock the subscriber's row (`FOR UPDATE`) and run the monotonic policy.
//! 3. Upsert the subscription, guarded by `tier_rank` so a concurrent
//!    first-time insert can never be downgraded.
//! 4. Commit. Any failure drops the transaction, rolling both writes back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::billing::{
    ActivationOutcome, PlanActivation, PlanTier, Subscription, SubscriptionActivator,
    TransactionRecord,
};
use crate::domain::foundation::{DomainError, ErrorCode, SubscriberId, Timestamp, TransactionId};
use crate::ports::{RecordOutcome, TransactionLedger};

/// PostgreSQL implementation of the TransactionLedger port.
pub struct PostgresTransactionLedger {
    pool: PgPool,
}

impl PostgresTransactionLedger {
    /// Creates a new PostgresTransactionLedger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    external_id: i64,
    amount_cents: i64,
    currency: String,
    success: bool,
    merchant_order_id: String,
    raw_snapshot: serde_json::Value,
    processed_at: DateTime<Utc>,
}

impl From<TransactionRow> for TransactionRecord {
    fn from(row: TransactionRow) -> Self {
        TransactionRecord {
            external_id: TransactionId::new(row.external_id),
            amount_cents: row.amount_cents,
            currency: row.currency,
            success: row.success,
            merchant_order_id: row.merchant_order_id,
            raw_snapshot: row.raw_snapshot,
            processed_at: Timestamp::from_datetime(row.processed_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    subscriber_id: String,
    plan_tier: String,
    activated_at: DateTime<Utc>,
    source_transaction_id: i64,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let plan_tier: PlanTier = row
            .plan_tier
            .parse()
            .map_err(|e| DomainError::corrupt_record(format!("Invalid tier value: {}", e)))?;
        let subscriber_id = SubscriberId::new(row.subscriber_id)
            .map_err(|e| DomainError::corrupt_record(format!("Invalid subscriber_id: {}", e)))?;

        Ok(Subscription {
            subscriber_id,
            plan_tier,
            activated_at: Timestamp::from_datetime(row.activated_at),
            source_transaction_id: TransactionId::new(row.source_transaction_id),
        })
    }
}

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

async fn lock_subscription(
    tx: &mut Transaction<'_, Postgres>,
    subscriber_id: &SubscriberId,
) -> Result<Option<Subscription>, DomainError> {
    let row: Option<SubscriptionRow> = sqlx::query_as(
        r#"
        SELECT subscriber_id, plan_tier, activated_at, source_transaction_id
        FROM subscriptions
        WHERE subscriber_id = $1
        FOR UPDATE
        "#,
    )
    .bind(subscriber_id.as_str())
    .fetch_optional(&mut **tx)
    .await
    .map_err(db_error("Failed to lock subscription"))?;

    row.map(Subscription::try_from).transpose()
}

/// Writes `subscription` unless a row with a higher rank is already stored.
///
/// Returns false when the rank guard suppressed the write.
async fn upsert_subscription(
    tx: &mut Transaction<'_, Postgres>,
    subscription: &Subscription,
) -> Result<bool, DomainError> {
    let result = sqlx::query(
        r#"
        INSERT INTO subscriptions (
            subscriber_id, plan_tier, tier_rank, activated_at, source_transaction_id
        ) VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (subscriber_id) DO UPDATE SET
            plan_tier = EXCLUDED.plan_tier,
            tier_rank = EXCLUDED.tier_rank,
            activated_at = EXCLUDED.activated_at,
            source_transaction_id = EXCLUDED.source_transaction_id
        WHERE subscriptions.tier_rank <= EXCLUDED.tier_rank
        "#,
    )
    .bind(subscription.subscriber_id.as_str())
    .bind(subscription.plan_tier.as_str())
    .bind(i16::from(subscription.plan_tier.rank()))
    .bind(subscription.activated_at.as_datetime())
    .bind(subscription.source_transaction_id.as_i64())
    .execute(&mut **tx)
    .await
    .map_err(db_error("Failed to write subscription"))?;

    Ok(result.rows_affected() == 1)
}

async fn apply_activation(
    tx: &mut Transaction<'_, Postgres>,
    activation: &PlanActivation,
) -> Result<ActivationOutcome, DomainError> {
    let current = lock_subscription(tx, &activation.subscriber_id).await?;
    let outcome = SubscriptionActivator::activate(current.as_ref(), activation, Timestamp::now());

    if !outcome.changed() {
        return Ok(outcome);
    }
    if upsert_subscription(tx, outcome.subscription()).await? {
        return Ok(outcome);
    }

    // A concurrent first activation for this subscriber won with a higher tier.
    let stored = lock_subscription(tx, &activation.subscriber_id)
        .await?
        .ok_or_else(|| DomainError::database("Subscription vanished during activation"))?;
    Ok(ActivationOutcome::Unchanged(stored))
}

#[async_trait]
impl TransactionLedger for PostgresTransactionLedger {
    async fn record_if_absent(
        &self,
        record: TransactionRecord,
        activation: Option<PlanActivation>,
    ) -> Result<RecordOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                external_id, amount_cents, currency, success,
                merchant_order_id, raw_snapshot, processed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (external_id) DO NOTHING
            "#,
        )
        .bind(record.external_id.as_i64())
        .bind(record.amount_cents)
        .bind(&record.currency)
        .bind(record.success)
        .bind(&record.merchant_order_id)
        .bind(&record.raw_snapshot)
        .bind(record.processed_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to insert transaction"))?;

        if inserted.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(db_error("Failed to roll back transaction"))?;
            return Ok(RecordOutcome::AlreadyProcessed);
        }

        let activation = match activation {
            Some(activation) => Some(apply_activation(&mut tx, &activation).await?),
            None => None,
        };

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        Ok(RecordOutcome::Inserted { activation })
    }

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionRecord>, DomainError> {
        let row: Option<TransactionRow> = sqlx::query_as(
            r#"
            SELECT external_id, amount_cents, currency, success,
                   merchant_order_id, raw_snapshot, processed_at
            FROM payment_transactions
            WHERE external_id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find transaction"))?;

        Ok(row.map(TransactionRecord::from))
    }

    async fn find_subscription(
        &self,
        subscriber_id: &SubscriberId,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT subscriber_id, plan_tier, activated_at, source_transaction_id
            FROM subscriptions
            WHERE subscriber_id = $1
            "#,
        )
        .bind(subscriber_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find subscription"))?;

        row.map(Subscription::try_from).transpose()
    }
}
