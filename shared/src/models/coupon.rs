//! Coupon Models

use serde::{Deserialize, Serialize};

/// Discount kind of a coupon template
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum DiscountKind {
    FixedAmount,
    Percent,
    FreeDelivery,
}

/// Coupon template (the "type" a voucher instantiates)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CouponType {
    pub id: i64,
    pub code: String,
    pub discount_kind: DiscountKind,
    /// Fixed amount in currency units, or percentage (30 = 30%); unused
    /// for free delivery
    pub value: f64,
    pub valid_from: i64,
    pub valid_until: i64,
}

/// Single-use voucher instance held by a shopper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserCoupon {
    pub id: i64,
    pub owner_id: i64,
    pub coupon_type_id: i64,
    pub is_used: bool,
    /// Instance expiry (may be tighter than the template window)
    pub valid_until: i64,
    pub used_at: Option<i64>,
    pub created_at: i64,
}

/// Voucher joined with its template, as listed to the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AvailableCoupon {
    pub id: i64,
    pub owner_id: i64,
    pub coupon_type_id: i64,
    pub code: String,
    pub discount_kind: DiscountKind,
    pub value: f64,
    pub is_used: bool,
    pub valid_until: i64,
}

/// Current coupon selection of a shopper (at most one)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CouponSelection {
    pub owner_id: i64,
    pub user_coupon_id: i64,
    pub selected_at: i64,
}
