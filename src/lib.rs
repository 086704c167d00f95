//! paywire - payment processor callback ingestion
//!
//! Verifies HMAC-signed transaction callbacks, records each transaction exactly
//! once, activates the purchased plan without ever downgrading a subscriber,
//! and pushes a notification to the subscriber's live connections.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
