//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresTransactionLedger` - Idempotent transaction ledger with subscription writes

mod transaction_ledger;

pub use transaction_ledger::PostgresTransactionLedger;
