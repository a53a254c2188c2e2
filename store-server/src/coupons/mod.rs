//! Coupon Allocator
//!
//! Single-use vouchers. A shopper holds at most one selected coupon; a new
//! selection replaces the old, and coupons never stack. The discount
//! arithmetic is pure; all usability decisions re-read persisted state.

use rust_decimal::prelude::*;
use sqlx::SqlitePool;

use crate::collaborators::NotificationService;
use crate::db::repository::coupon;
use crate::utils::{AppError, AppResult};
use shared::models::{AvailableCoupon, DiscountKind};

/// Effect of applying a coupon to a cart
#[derive(Debug, Clone, PartialEq)]
pub struct CouponEffect {
    pub discounted_subtotal: Decimal,
    pub shipping: Decimal,
    /// Amount taken off the subtotal (0 for free delivery)
    pub discount: Decimal,
}

/// Apply a coupon kind to a subtotal and shipping line.
///
/// - fixed_amount: `max(0, subtotal − value)`
/// - percent: `subtotal × (1 − value/100)`
/// - free_delivery: subtotal unchanged, shipping forced to 0
pub fn apply_coupon(
    kind: DiscountKind,
    value: f64,
    subtotal: Decimal,
    shipping: Decimal,
) -> CouponEffect {
    match kind {
        DiscountKind::FixedAmount => {
            let discounted = (subtotal - crate::money::to_decimal(value)).max(Decimal::ZERO);
            CouponEffect {
                discounted_subtotal: discounted,
                shipping,
                discount: subtotal - discounted,
            }
        }
        DiscountKind::Percent => {
            let rate = crate::money::to_decimal(value) / Decimal::ONE_HUNDRED;
            let discounted = (subtotal * (Decimal::ONE - rate)).max(Decimal::ZERO);
            CouponEffect {
                discounted_subtotal: discounted,
                shipping,
                discount: subtotal - discounted,
            }
        }
        DiscountKind::FreeDelivery => CouponEffect {
            discounted_subtotal: subtotal,
            shipping: Decimal::ZERO,
            discount: Decimal::ZERO,
        },
    }
}

#[derive(Clone)]
pub struct CouponService {
    pool: SqlitePool,
    notify: NotificationService,
}

impl CouponService {
    pub fn new(pool: SqlitePool, notify: NotificationService) -> Self {
        Self { pool, notify }
    }

    /// Unused, unexpired vouchers of the shopper
    pub async fn list_available(&self, owner_id: i64) -> AppResult<Vec<AvailableCoupon>> {
        let now = shared::util::now_millis();
        Ok(coupon::list_available(&self.pool, owner_id, now).await?)
    }

    /// Make one voucher the sole applied coupon, replacing any prior
    /// selection. Ownership and usability are checked now and re-checked
    /// at checkout commit.
    pub async fn select(&self, owner_id: i64, user_coupon_id: i64) -> AppResult<AvailableCoupon> {
        let now = shared::util::now_millis();
        let mut conn = self.pool.acquire().await?;
        let voucher = coupon::find_usable(&mut conn, owner_id, user_coupon_id, now)
            .await?
            .ok_or_else(|| {
                AppError::conflict(format!("Coupon {user_coupon_id} is not usable"))
            })?;
        drop(conn);

        coupon::select(&self.pool, owner_id, user_coupon_id, now).await?;
        self.notify.broadcast_sync(
            "coupon",
            "selected",
            &user_coupon_id.to_string(),
            Some(owner_id),
            Some(&voucher.code),
        );
        Ok(voucher)
    }

    /// Clear the selection; idempotent
    pub async fn deselect(&self, owner_id: i64) -> AppResult<bool> {
        let cleared = coupon::deselect(&self.pool, owner_id).await?;
        if cleared {
            self.notify
                .broadcast_sync("coupon", "deselected", "-", Some(owner_id), None::<&()>);
        }
        Ok(cleared)
    }

    /// The currently selected voucher, if it is still usable. A selection
    /// pointing at a consumed or expired voucher reads as none; it never
    /// resurrects a dead coupon.
    pub async fn selected(&self, owner_id: i64) -> AppResult<Option<AvailableCoupon>> {
        let now = shared::util::now_millis();
        let mut conn = self.pool.acquire().await?;
        let Some(selection) = coupon::find_selection(&mut conn, owner_id).await? else {
            return Ok(None);
        };
        Ok(coupon::find_usable(&mut conn, owner_id, selection.user_coupon_id, now).await?)
    }
}
