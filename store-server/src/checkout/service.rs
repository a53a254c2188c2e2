//! Checkout Service
//!
//! Orchestrates the final payable total at the moment of payment. Reads
//! (coupon usability, wallet balance) are taken at call time, the Payment
//! Collaborator is invoked with the computed total, and only a confirmed
//! capture commits the side effects (wallet debit, coupon consume, order
//! record, engagement points) in one transaction keyed by the payment
//! transaction id, so a retried commit cannot double-apply anything.
//! Cancellation or decline before that point leaves the cart untouched.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::batches::BatchManager;
use crate::checkout::calculator::{QuoteContext, compute_breakdown};
use crate::collaborators::{NotificationService, PaymentCollaborator, PaymentOutcome};
use crate::coupons::CouponService;
use crate::db::repository::{coupon, order, shopper, wallet};
use crate::money;
use crate::utils::{AppError, AppResult};
use shared::message::NotificationLevel;
use shared::models::{
    AvailableCoupon, CheckoutBreakdown, CheckoutReceipt, CheckoutRequest, OrderInput, OrderStatus,
    StoreOrder,
};

#[derive(Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    payment: Arc<dyn PaymentCollaborator>,
    batches: BatchManager,
    coupons: CouponService,
    notify: NotificationService,
    default_currency: String,
}

impl CheckoutService {
    pub fn new(
        pool: SqlitePool,
        payment: Arc<dyn PaymentCollaborator>,
        batches: BatchManager,
        coupons: CouponService,
        notify: NotificationService,
        default_currency: String,
    ) -> Self {
        Self {
            pool,
            payment,
            batches,
            coupons,
            notify,
            default_currency,
        }
    }

    /// Price the cart with the current selection and balance. No side
    /// effects; safe to call on every cart mutation.
    pub async fn quote(
        &self,
        owner_id: i64,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutBreakdown> {
        money::validate_checkout(request)?;
        let (breakdown, _) = self.price_current(owner_id, request).await?;
        Ok(breakdown)
    }

    /// Charge the cart and commit the reward side effects.
    pub async fn pay(
        &self,
        owner_id: i64,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutReceipt> {
        money::validate_checkout(request)?;

        // Recompute from persisted state at the moment of payment; a
        // client-supplied breakdown is never trusted
        let (breakdown, selected_coupon) = self.price_current(owner_id, request).await?;

        let currency = request
            .currency
            .clone()
            .unwrap_or_else(|| self.default_currency.clone());

        let transaction_id = match self
            .payment
            .authorize_and_capture(breakdown.total, &currency)
            .await?
        {
            PaymentOutcome::Approved { transaction_id } => transaction_id,
            PaymentOutcome::Declined { reason } => {
                tracing::info!(owner_id, total = breakdown.total, reason = %reason, "Payment declined");
                return Err(AppError::PaymentDeclined(reason));
            }
        };

        let paid_order = self
            .commit_confirmed(
                owner_id,
                &breakdown,
                selected_coupon.as_ref(),
                request.wallet_amount_requested,
                &transaction_id,
            )
            .await?;

        // Group the paid order into the owner's shipment batch
        let batch = self
            .batches
            .open_or_attach(
                owner_id,
                &OrderInput {
                    id: paid_order.id,
                    total: paid_order.total,
                    status: OrderStatus::Paid,
                },
            )
            .await?;

        self.notify
            .broadcast_sync("wallet", "spent", &transaction_id, Some(owner_id), None::<&()>);
        self.notify.notify(
            owner_id,
            NotificationLevel::Info,
            "checkout_confirmed",
            serde_json::json!({
                "order_id": paid_order.id,
                "batch_id": batch.id,
                "total": breakdown.total,
            }),
        );
        tracing::info!(
            owner_id,
            order_id = paid_order.id,
            batch_id = batch.id,
            total = breakdown.total,
            "Checkout confirmed"
        );

        Ok(CheckoutReceipt {
            order_id: paid_order.id,
            batch_id: batch.id,
            transaction_id,
            breakdown,
        })
    }

    /// Read current coupon selection and balance, compute the breakdown
    async fn price_current(
        &self,
        owner_id: i64,
        request: &CheckoutRequest,
    ) -> AppResult<(CheckoutBreakdown, Option<AvailableCoupon>)> {
        // Shopper must exist before we price anything against their state
        let mut conn = self.pool.acquire().await?;
        shopper::engagement_points(&mut conn, owner_id).await?;
        let balance = wallet::balance(&mut conn, owner_id).await?;
        drop(conn);

        let selected = self.coupons.selected(owner_id).await?;

        let breakdown = compute_breakdown(
            &request.items,
            request.shipping_fee,
            &QuoteContext {
                coupon: selected.as_ref(),
                wallet_balance: balance,
                wallet_requested: request.wallet_amount_requested,
            },
        );
        Ok((breakdown, selected))
    }

    /// Commit every deferred side effect of a captured payment in one
    /// transaction. Idempotent on `transaction_id`: the order insert, the
    /// wallet debit and the coupon consume are all keyed or conditional,
    /// so a retry after a crash re-commits nothing.
    async fn commit_confirmed(
        &self,
        owner_id: i64,
        breakdown: &CheckoutBreakdown,
        selected_coupon: Option<&AvailableCoupon>,
        wallet_requested: f64,
        transaction_id: &str,
    ) -> AppResult<StoreOrder> {
        let now = shared::util::now_millis();
        let mut tx = self.pool.begin().await?;

        let (paid_order, inserted) =
            order::insert_paid(&mut tx, owner_id, breakdown.total, transaction_id, now).await?;

        if breakdown.wallet_applied > 0.0 {
            let source_key = format!("checkout:{transaction_id}");
            let effective = wallet::spend_clamped(
                &mut tx,
                owner_id,
                &source_key,
                wallet_requested,
                breakdown.after_coupon,
                now,
            )
            .await?;
            // The balance is re-read inside this transaction; a concurrent
            // spend since the quote can only shrink the debit, never push
            // the balance negative
            if (effective - breakdown.wallet_applied).abs() > 0.005 {
                tracing::warn!(
                    owner_id,
                    quoted = breakdown.wallet_applied,
                    effective,
                    "Wallet debit diverged from quote at commit time"
                );
            }
        }

        if let Some(voucher) = selected_coupon {
            let consumed = coupon::consume(&mut tx, voucher.id, now).await?;
            if !consumed {
                // Already marked used: a retried commit for this same
                // payment, or a concurrent checkout that won the voucher
                tracing::info!(owner_id, coupon_id = voucher.id, "Coupon consume replayed as no-op");
            }
            coupon::clear_selection_of(&mut tx, owner_id, voucher.id).await?;
        }

        if inserted {
            // Engagement accrual: one point per currency unit actually paid
            let points = breakdown.total.floor() as i64;
            if points > 0 {
                shopper::add_engagement_points(&mut tx, owner_id, points).await?;
            }
        }

        tx.commit().await?;
        Ok(paid_order)
    }
}
