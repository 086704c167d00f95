//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - Handshake token validation (HS256 JWT, mock)
//! - `http` - axum endpoints and router
//! - `ledger` - In-memory transaction ledger
//! - `postgres` - PostgreSQL transaction ledger
//! - `websocket` - Live notification connections and fanout

pub mod auth;
pub mod http;
pub mod ledger;
pub mod postgres;
pub mod websocket;
