//! Shared types for the storefront reward engine
//!
//! Common types used across the server and its clients: domain models,
//! message-bus payloads, and id/time utilities.
//! DB row types derive `sqlx::FromRow` behind the `db` feature so that
//! API clients can depend on this crate without pulling in sqlx.

pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use message::{BusMessage, EventType, SyncPayload};
pub use serde::{Deserialize, Serialize};
