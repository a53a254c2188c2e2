//! Loyalty Tier Model

use serde::{Deserialize, Serialize};

/// Loyalty tier configuration row
///
/// Tier 1..=3; a shopper resolves to the highest tier whose `min_points`
/// does not exceed their engagement points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LoyaltyTier {
    pub tier: i64,
    /// Wallet earning multiplier (e.g. 1.0, 1.5, 2.0)
    pub multiplier: f64,
    /// Engagement points required to reach this tier
    pub min_points: i64,
}
