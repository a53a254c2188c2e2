use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== Notification Level ====================

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ==================== Sync ====================

/// Resource-changed signal
///
/// `version` increases monotonically per resource so clients can discard
/// out-of-order messages; it carries no authority beyond "re-fetch if you
/// care".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    /// Resource name: "batch", "wallet", "coupon", ...
    pub resource: String,
    pub version: u64,
    /// "created" | "updated" | "finalized" | "expired" | ...
    pub action: String,
    pub id: String,
    /// Owner scope, None for global resources
    pub owner_id: Option<i64>,
    pub data: Option<serde_json::Value>,
}

// ==================== Notification ====================

/// Shopper-facing event notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub owner_id: i64,
    pub level: NotificationLevel,
    /// Event kind: "batch_finalized", "wallet_awarded", "gift_unlocked", ...
    pub event: String,
    pub body: serde_json::Value,
    pub created_at: i64,
}
