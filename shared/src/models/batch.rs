//! Delivery Batch Model

use serde::{Deserialize, Serialize};

/// Batch lifecycle status
///
/// `Validated`, `Expired` and `Cancelled` are terminal: no transition
/// ever leaves them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum BatchStatus {
    Pending,
    Validated,
    Expired,
    Cancelled,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchStatus::Pending)
    }
}

/// Delivery batch entity
///
/// A time-boxed grouping of one shopper's orders destined for a single
/// consolidated shipment. At most one `Pending` batch per owner exists at
/// any time (enforced by a partial unique index).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DeliveryBatch {
    pub id: i64,
    pub owner_id: i64,
    pub status: BatchStatus,
    /// Shipment order produced at finalize (set together with `validated_at`)
    pub shipment_order_id: Option<i64>,
    pub created_at: i64,
    /// Expiry instant: a pending batch past this point is dead even if the
    /// sweep has not visited it yet
    pub validate_at: i64,
    pub validated_at: Option<i64>,
    pub updated_at: i64,
}

impl DeliveryBatch {
    /// Whether this pending batch has outlived its window.
    ///
    /// Client countdowns are presentational; this check against `now` is
    /// the authoritative one at read/attach/finalize time.
    pub fn is_stale(&self, now: i64) -> bool {
        self.status == BatchStatus::Pending && now >= self.validate_at
    }
}

/// Finalize result returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFinalizeResult {
    pub batch_id: i64,
    pub shipment_order_id: i64,
    /// True when this call performed the transition, false for a benign
    /// replay of an already-validated batch
    pub newly_validated: bool,
}
