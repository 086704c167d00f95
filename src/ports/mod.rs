//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `TransactionLedger` - Idempotent transaction record plus subscription write
//! - `NotificationPublisher` - Best-effort push to live connections
//! - `SessionValidator` - Bearer token validation for real-time handshakes

mod notification_publisher;
mod session_validator;
mod transaction_ledger;

pub use notification_publisher::{DeliveryReport, NotificationError, NotificationPublisher};
pub use session_validator::SessionValidator;
pub use transaction_ledger::{RecordOutcome, TransactionLedger};
