//! Gift Threshold Evaluator
//!
//! Computes cumulative spend (batch orders + live cart) against the single
//! active threshold. Within an open batch the cumulative only grows, so
//! `remaining` is monotonically non-increasing until the batch closes; the
//! UI recomputes on every cart mutation and order attachment.

use rust_decimal::prelude::*;
use sqlx::SqlitePool;

use crate::db::repository::{batch, gift, order};
use crate::money;
use crate::utils::{AppError, AppResult};
use shared::models::{GiftStatus, GiftThreshold};

/// Placeholder interpolated into `before_message`
const REMAINING_PLACEHOLDER: &str = "{remaining}";

/// Pure evaluation of a cumulative amount against a threshold
pub fn evaluate(threshold: &GiftThreshold, cumulative: Decimal) -> GiftStatus {
    let target = money::to_decimal(threshold.threshold_amount);
    let unlocked = cumulative >= target;
    let remaining = if unlocked {
        Decimal::ZERO
    } else {
        target - cumulative
    };
    let remaining = money::to_f64(remaining);

    let message = if unlocked {
        threshold.after_message.clone()
    } else {
        threshold
            .before_message
            .replace(REMAINING_PLACEHOLDER, &format!("{remaining:.2}"))
    };

    GiftStatus {
        unlocked,
        remaining,
        message,
        threshold_amount: threshold.threshold_amount,
        gift_name: threshold.gift_name.clone(),
    }
}

#[derive(Clone)]
pub struct GiftService {
    pool: SqlitePool,
}

impl GiftService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Gift progress for a shopper: batch cumulative (when a batch is
    /// given) plus the live cart subtotal.
    pub async fn status(
        &self,
        owner_id: i64,
        batch_id: Option<i64>,
        cart_subtotal: f64,
    ) -> AppResult<GiftStatus> {
        money::validate_amount(cart_subtotal, "cart_subtotal")?;

        let mut conn = self.pool.acquire().await?;

        let threshold = gift::active_threshold(&mut conn)
            .await?
            .ok_or_else(|| AppError::validation("No active gift threshold configured"))?;

        let batch_sum = match batch_id {
            Some(batch_id) => {
                let batch = batch::find_by_id(&mut conn, batch_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Batch {batch_id}")))?;
                if batch.owner_id != owner_id {
                    return Err(AppError::not_found(format!("Batch {batch_id}")));
                }
                order::sum_for_batch(&mut conn, batch_id).await?
            }
            None => 0.0,
        };

        let cumulative = money::to_decimal(batch_sum) + money::to_decimal(cart_subtotal);
        Ok(evaluate(&threshold, cumulative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threshold(amount: f64) -> GiftThreshold {
        GiftThreshold {
            id: 1,
            threshold_amount: amount,
            before_message: "Spend {remaining} more to unlock your gift".to_string(),
            after_message: "Your gift ships with this batch!".to_string(),
            gift_name: "Canvas tote".to_string(),
            is_active: true,
            created_at: 0,
        }
    }

    #[test]
    fn test_unlocked_at_and_above_threshold() {
        // batchCumulative=50 + cart=25 vs threshold 69
        let status = evaluate(&threshold(69.0), money::to_decimal(75.0));
        assert!(status.unlocked);
        assert_eq!(status.remaining, 0.0);
        assert_eq!(status.message, "Your gift ships with this batch!");

        // Exactly at the threshold counts as unlocked
        let status = evaluate(&threshold(69.0), money::to_decimal(69.0));
        assert!(status.unlocked);
        assert_eq!(status.remaining, 0.0);
    }

    #[test]
    fn test_locked_reports_remaining() {
        // cart=30 vs threshold 69 → 39 missing
        let status = evaluate(&threshold(69.0), money::to_decimal(30.0));
        assert!(!status.unlocked);
        assert_eq!(status.remaining, 39.0);
        assert_eq!(status.message, "Spend 39.00 more to unlock your gift");
    }

    #[test]
    fn test_zero_cumulative() {
        let status = evaluate(&threshold(69.0), Decimal::ZERO);
        assert!(!status.unlocked);
        assert_eq!(status.remaining, 69.0);
    }

    #[test]
    fn test_message_without_placeholder_unchanged() {
        let mut t = threshold(10.0);
        t.before_message = "Keep shopping!".to_string();
        let status = evaluate(&t, money::to_decimal(4.0));
        assert_eq!(status.message, "Keep shopping!");
        assert_eq!(status.remaining, 6.0);
    }

    mod service {
        use super::*;
        use crate::db::repository::test_support::{seed_shopper, test_pool};
        use crate::db::repository::{batch as batch_repo, gift as gift_repo, order as order_repo};
        use shared::models::{OrderInput, OrderStatus};

        #[tokio::test]
        async fn test_status_sums_batch_and_cart() {
            let pool = test_pool().await;
            seed_shopper(&pool, 1, 0).await;
            gift_repo::create(&pool, 69.0, "Need {remaining} more", "Unlocked!", "Tote", true)
                .await
                .unwrap();

            let mut conn = pool.acquire().await.unwrap();
            let batch = batch_repo::insert_pending(&mut conn, 1, i64::MAX, 0).await.unwrap();
            order_repo::attach(
                &mut conn,
                1,
                &OrderInput { id: 100, total: 40.0, status: OrderStatus::Paid },
                batch.id,
                0,
            )
            .await
            .unwrap();
            order_repo::attach(
                &mut conn,
                1,
                &OrderInput { id: 101, total: 10.0, status: OrderStatus::Cancelled },
                batch.id,
                0,
            )
            .await
            .unwrap();
            drop(conn);

            let svc = GiftService::new(pool);
            // 40 (cancelled 10 excluded) + cart 25 = 65 < 69
            let status = svc.status(1, Some(batch.id), 25.0).await.unwrap();
            assert!(!status.unlocked);
            assert_eq!(status.remaining, 4.0);

            // 40 + 29 = 69 → unlocked
            let status = svc.status(1, Some(batch.id), 29.0).await.unwrap();
            assert!(status.unlocked);
        }

        #[tokio::test]
        async fn test_status_without_batch_uses_cart_only() {
            let pool = test_pool().await;
            seed_shopper(&pool, 1, 0).await;
            gift_repo::create(&pool, 69.0, "Need {remaining} more", "Unlocked!", "Tote", true)
                .await
                .unwrap();

            let svc = GiftService::new(pool);
            let status = svc.status(1, None, 30.0).await.unwrap();
            assert!(!status.unlocked);
            assert_eq!(status.remaining, 39.0);
        }

        #[tokio::test]
        async fn test_status_missing_config_is_validation_error() {
            let pool = test_pool().await;
            seed_shopper(&pool, 1, 0).await;
            let svc = GiftService::new(pool);
            let err = svc.status(1, None, 10.0).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        #[tokio::test]
        async fn test_status_foreign_batch_hidden() {
            let pool = test_pool().await;
            seed_shopper(&pool, 1, 0).await;
            seed_shopper(&pool, 2, 0).await;
            gift_repo::create(&pool, 69.0, "b", "a", "Tote", true).await.unwrap();

            let mut conn = pool.acquire().await.unwrap();
            let batch = batch_repo::insert_pending(&mut conn, 2, i64::MAX, 0).await.unwrap();
            drop(conn);

            let svc = GiftService::new(pool);
            let err = svc.status(1, Some(batch.id), 10.0).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }
    }
}
