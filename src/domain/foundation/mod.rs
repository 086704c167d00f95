//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types
//! that form the vocabulary of the billing domain.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedSubscriber};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ConnectionId, SubscriberId, TransactionId};
pub use timestamp::Timestamp;
