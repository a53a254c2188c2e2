//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization. Inputs are validated at the boundary so
//! the conversion helpers can assume sane ranges.

use rust_decimal::prelude::*;

use crate::utils::{AppError, AppResult};
use shared::models::{CartItemInput, CheckoutRequest};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed amount for any single monetary value (€1,000,000)
pub const MAX_AMOUNT: f64 = 1_000_000.0;
/// Maximum allowed quantity per cart line
const MAX_QUANTITY: i32 = 9999;
/// Maximum length of a wallet source key
const MAX_SOURCE_KEY_LEN: usize = 128;

/// Convert a validated f64 into Decimal; non-finite input collapses to zero
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert a Decimal back to f64, rounded to 2dp half-up
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        // SAFETY: Decimal rounded to 2dp with inputs bounded by MAX_AMOUNT
        // (validated at the boundary) is always representable as f64
        .expect("Decimal rounded to 2dp is always representable as f64")
}

/// Round an f64 amount to 2dp through Decimal
pub fn round_amount(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::validation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a non-negative bounded monetary amount
pub fn validate_amount(value: f64, field_name: &str) -> AppResult<()> {
    require_finite(value, field_name)?;
    if value < 0.0 {
        return Err(AppError::validation(format!(
            "{} must be non-negative, got {}",
            field_name, value
        )));
    }
    if value > MAX_AMOUNT {
        return Err(AppError::validation(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field_name, MAX_AMOUNT, value
        )));
    }
    Ok(())
}

/// Validate a wallet award: strictly positive amount, sane source key
pub fn validate_award(source_key: &str, base_amount: f64) -> AppResult<()> {
    if source_key.trim().is_empty() {
        return Err(AppError::validation("source_key must not be empty"));
    }
    if source_key.len() > MAX_SOURCE_KEY_LEN {
        return Err(AppError::validation(format!(
            "source_key exceeds maximum length ({})",
            MAX_SOURCE_KEY_LEN
        )));
    }
    validate_amount(base_amount, "base_amount")?;
    if base_amount == 0.0 {
        return Err(AppError::validation("base_amount must be positive"));
    }
    Ok(())
}

/// Validate a cart line before quoting or charging
pub fn validate_cart_item(item: &CartItemInput) -> AppResult<()> {
    validate_amount(item.unit_price, "unit_price")?;
    if item.quantity <= 0 {
        return Err(AppError::validation(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }
    Ok(())
}

/// Validate a full checkout request
pub fn validate_checkout(req: &CheckoutRequest) -> AppResult<()> {
    if req.items.is_empty() {
        return Err(AppError::validation("cart must not be empty"));
    }
    for item in &req.items {
        validate_cart_item(item)?;
    }
    validate_amount(req.shipping_fee, "shipping_fee")?;
    validate_amount(req.wallet_amount_requested, "wallet_amount_requested")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(unit_price: f64, quantity: i32) -> CartItemInput {
        CartItemInput {
            product_id: 1,
            name: "Test".to_string(),
            unit_price,
            quantity,
        }
    }

    #[test]
    fn test_round_amount_half_up() {
        assert_eq!(round_amount(10.006), 10.01);
        assert_eq!(round_amount(10.004), 10.0);
        // 0.125 is exactly representable; midpoint rounds away from zero
        assert_eq!(round_amount(0.125), 0.13);
    }

    #[test]
    fn test_to_decimal_non_finite_collapses_to_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
        assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
    }

    #[test]
    fn test_validate_amount_rejects_negative() {
        assert!(validate_amount(-0.01, "x").is_err());
        assert!(validate_amount(0.0, "x").is_ok());
    }

    #[test]
    fn test_validate_amount_rejects_nan_and_overflow() {
        assert!(validate_amount(f64::NAN, "x").is_err());
        assert!(validate_amount(MAX_AMOUNT + 1.0, "x").is_err());
        assert!(validate_amount(MAX_AMOUNT, "x").is_ok());
    }

    #[test]
    fn test_validate_award_rejects_zero_and_empty_key() {
        assert!(validate_award("k", 0.0).is_err());
        assert!(validate_award("", 5.0).is_err());
        assert!(validate_award("  ", 5.0).is_err());
        assert!(validate_award("diamond-42", 5.0).is_ok());
    }

    #[test]
    fn test_validate_cart_item() {
        assert!(validate_cart_item(&make_item(10.0, 1)).is_ok());
        assert!(validate_cart_item(&make_item(-1.0, 1)).is_err());
        assert!(validate_cart_item(&make_item(10.0, 0)).is_err());
        assert!(validate_cart_item(&make_item(10.0, 10_000)).is_err());
    }

    #[test]
    fn test_validate_checkout_empty_cart() {
        let req = CheckoutRequest {
            items: vec![],
            shipping_fee: 0.0,
            wallet_amount_requested: 0.0,
            currency: None,
        };
        assert!(validate_checkout(&req).is_err());
    }
}
