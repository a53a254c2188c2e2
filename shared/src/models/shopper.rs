//! Shopper Model

use serde::{Deserialize, Serialize};

/// Shopper entity
///
/// An identity may start anonymous (created by the identity endpoint) and
/// later be claimed at login; either way the row is the single authority
/// for engagement points, never a client-held value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Shopper {
    pub id: i64,
    pub display_name: String,
    /// Accumulated engagement points; drives loyalty tier resolution
    pub engagement_points: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
