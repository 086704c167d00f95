//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 tokens issued by the account service
//! - `mock` - Test implementation that doesn't require tokens

mod jwt;
mod mock;

pub use jwt::{issue_token, JwtSessionValidator};
pub use mock::MockSessionValidator;
