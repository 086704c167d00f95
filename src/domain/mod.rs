//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `billing` - Callback verification, order decoding and subscription policy

pub mod billing;
pub mod foundation;
