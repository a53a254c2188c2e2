//! Store Order Model

use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    Pending,
    Paid,
    Preparing,
    Shipped,
    Completed,
    Cancelled,
    Failed,
    Refunded,
}

impl OrderStatus {
    /// Statuses excluded from every cumulative sum (batch totals, gift
    /// progress). Kept in one place so the SQL filter and the in-memory
    /// filter cannot drift.
    pub const EXCLUDED: [OrderStatus; 3] = [
        OrderStatus::Cancelled,
        OrderStatus::Failed,
        OrderStatus::Refunded,
    ];

    pub fn counts_toward_totals(&self) -> bool {
        !Self::EXCLUDED.contains(self)
    }

    /// DB column value (SCREAMING_SNAKE_CASE, same as the serde form)
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

/// Store order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StoreOrder {
    pub id: i64,
    pub owner_id: i64,
    /// Batch this order ships with; null until attached
    pub batch_id: Option<i64>,
    pub total: f64,
    pub status: OrderStatus,
    /// Payment transaction that produced this order, when it was created
    /// by a confirmed checkout (idempotency guard for retried commits)
    pub payment_ref: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order payload for attach (the order already exists upstream; the engine
/// only needs its id, total and status)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInput {
    pub id: i64,
    pub total: f64,
    pub status: OrderStatus,
}
