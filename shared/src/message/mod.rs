//! Message types for the advisory refresh bus
//!
//! Shared between store-server and its UI clients. Delivery is best-effort:
//! a client that receives a message may re-fetch, but no authoritative
//! decision is ever made from a pushed value: every mutation re-reads
//! persisted state at mutation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// Bus event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// System notification (informational)
    Notification = 0,
    /// Resource changed, clients may re-fetch
    Sync = 1,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Notification => write!(f, "notification"),
            EventType::Sync => write!(f, "sync"),
        }
    }
}

/// Serialized message as carried on the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    /// Owner the message concerns; None for broadcast
    pub owner_id: Option<i64>,
    pub payload: serde_json::Value,
}

impl BusMessage {
    pub fn sync(payload: &SyncPayload) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type: EventType::Sync,
            owner_id: payload.owner_id,
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn notification(payload: &NotificationPayload) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type: EventType::Notification,
            owner_id: Some(payload.owner_id),
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        }
    }
}
