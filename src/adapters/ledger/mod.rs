//! Non-database transaction ledger adapters.

mod in_memory;

pub use in_memory::InMemoryTransactionLedger;
