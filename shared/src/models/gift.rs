//! Gift Threshold Models

use serde::{Deserialize, Serialize};

/// Cumulative-spend gift threshold configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct GiftThreshold {
    pub id: i64,
    pub threshold_amount: f64,
    /// Shown while locked; `{remaining}` is interpolated with the amount
    /// still missing
    pub before_message: String,
    /// Shown once unlocked
    pub after_message: String,
    /// Descriptor of the bundled free item
    pub gift_name: String,
    pub is_active: bool,
    pub created_at: i64,
}

/// Gift progress computed for one shopper/cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftStatus {
    pub unlocked: bool,
    /// `max(0, threshold − cumulative)`, 2dp
    pub remaining: f64,
    pub message: String,
    pub threshold_amount: f64,
    pub gift_name: String,
}
