//! Checkout Calculator
//!
//! Pure price composition. The order of steps is a fixed design decision:
//! coupon before wallet. Reversing it changes the result for percentage
//! coupons and must be preserved exactly.

use rust_decimal::prelude::*;

use crate::coupons::apply_coupon;
use crate::money::{to_decimal, to_f64};
use shared::models::{AvailableCoupon, CartItemInput, CheckoutBreakdown};

/// Inputs beyond the cart lines: selected coupon and wallet state
#[derive(Debug, Clone, Default)]
pub struct QuoteContext<'a> {
    pub coupon: Option<&'a AvailableCoupon>,
    pub wallet_balance: f64,
    pub wallet_requested: f64,
}

/// Compose the full breakdown:
///
/// 1. `subtotal = Σ line items`
/// 2. coupon effect on subtotal and shipping
/// 3. `after_coupon = discounted subtotal + (possibly zeroed) shipping`
/// 4. `wallet_applied = min(requested, balance, after_coupon)`
/// 5. `total = max(0, after_coupon − wallet_applied)`
pub fn compute_breakdown(
    items: &[CartItemInput],
    shipping_fee: f64,
    ctx: &QuoteContext<'_>,
) -> CheckoutBreakdown {
    let subtotal: Decimal = items
        .iter()
        .map(|item| to_decimal(item.unit_price) * Decimal::from(item.quantity))
        .sum();

    let shipping = to_decimal(shipping_fee);
    let (discounted_subtotal, shipping, coupon_discount, coupon_code) = match ctx.coupon {
        Some(coupon) => {
            let effect = apply_coupon(coupon.discount_kind, coupon.value, subtotal, shipping);
            (
                effect.discounted_subtotal,
                effect.shipping,
                effect.discount,
                Some(coupon.code.clone()),
            )
        }
        None => (subtotal, shipping, Decimal::ZERO, None),
    };

    let after_coupon = discounted_subtotal + shipping;

    let wallet_applied = to_decimal(ctx.wallet_requested)
        .min(to_decimal(ctx.wallet_balance))
        .min(after_coupon)
        .max(Decimal::ZERO);

    let total = (after_coupon - wallet_applied).max(Decimal::ZERO);

    CheckoutBreakdown {
        subtotal: to_f64(subtotal),
        coupon_discount: to_f64(coupon_discount),
        shipping: to_f64(shipping),
        after_coupon: to_f64(after_coupon),
        wallet_applied: to_f64(wallet_applied),
        total: to_f64(total),
        coupon_code,
    }
}
