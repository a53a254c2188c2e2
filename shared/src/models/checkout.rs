//! Checkout Payloads

use serde::{Deserialize, Serialize};

/// One cart line item as submitted by the storefront
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemInput {
    pub product_id: i64,
    pub name: String,
    pub unit_price: f64,
    pub quantity: i32,
}

/// Checkout request body (quote and pay share it)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartItemInput>,
    pub shipping_fee: f64,
    /// Store credit the shopper asked to apply; clamped server-side
    #[serde(default)]
    pub wallet_amount_requested: f64,
    pub currency: Option<String>,
}

/// Full price breakdown
///
/// Field order mirrors the fixed composition order: coupon strictly before
/// wallet. Reversing them changes the result for percentage coupons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutBreakdown {
    pub subtotal: f64,
    /// Discount taken off the subtotal by the selected coupon
    pub coupon_discount: f64,
    /// Shipping after the coupon effect (0 for free-delivery coupons)
    pub shipping: f64,
    /// Discounted subtotal + shipping
    pub after_coupon: f64,
    /// Store credit actually applied: `min(requested, balance, after_coupon)`
    pub wallet_applied: f64,
    /// `max(0, after_coupon − wallet_applied)`
    pub total: f64,
    /// Coupon code used, for display
    pub coupon_code: Option<String>,
}

/// Result of a confirmed payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order_id: i64,
    pub batch_id: i64,
    pub transaction_id: String,
    pub breakdown: CheckoutBreakdown,
}
