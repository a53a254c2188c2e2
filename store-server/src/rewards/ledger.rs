//! Wallet Service
//!
//! Award, balance and bounded-history reads over the per-shopper store
//! credit ledger. The tier multiplier is resolved inside the same atomic
//! append that credits the ledger, so a tier change can never credit at a
//! superseded multiplier, and a duplicate trigger returns the original
//! award instead of double-crediting.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::collaborators::NotificationService;
use crate::db::repository::{loyalty, shopper, wallet};
use crate::money;
use crate::rewards::tiers;
use crate::utils::{AppError, AppResult};
use shared::message::NotificationLevel;
use shared::models::{AwardResult, WalletLedgerEntry};

const LEDGER_HISTORY_LIMIT: i64 = 50;

/// Balance plus the currently resolved loyalty standing, for the UI
#[derive(Debug, Clone, Serialize)]
pub struct WalletProfile {
    pub balance: f64,
    pub tier: i64,
    pub multiplier: f64,
    pub engagement_points: i64,
}

#[derive(Clone)]
pub struct WalletService {
    pool: SqlitePool,
    notify: NotificationService,
}

impl WalletService {
    pub fn new(pool: SqlitePool, notify: NotificationService) -> Self {
        Self { pool, notify }
    }

    /// Credit `base_amount × tier multiplier` under `(owner, source_key)`.
    ///
    /// Repeated triggers with the same key are no-op replays that report
    /// the originally credited amount with `already_claimed = true`.
    pub async fn award(
        &self,
        owner_id: i64,
        source_key: &str,
        base_amount: f64,
    ) -> AppResult<AwardResult> {
        money::validate_award(source_key, base_amount)?;

        let now = shared::util::now_millis();
        let mut conn = self.pool.acquire().await?;

        let inserted =
            wallet::insert_award_resolving_tier(&mut conn, owner_id, source_key, base_amount, now)
                .await?;

        let entry = wallet::find_entry(&mut conn, owner_id, source_key).await?;
        let entry = match entry {
            Some(entry) => entry,
            None => {
                // Nothing inserted and nothing to replay: the tier subquery
                // matched no row. Distinguish a missing shopper from a
                // missing ladder for the caller.
                shopper::engagement_points(&mut conn, owner_id).await?;
                return Err(AppError::validation("Loyalty tier ladder is not configured"));
            }
        };
        let new_balance = wallet::balance(&mut conn, owner_id).await?;
        drop(conn);

        if inserted {
            self.notify.broadcast_sync(
                "wallet",
                "awarded",
                source_key,
                Some(owner_id),
                Some(&entry.amount),
            );
            self.notify.notify(
                owner_id,
                NotificationLevel::Info,
                "wallet_awarded",
                serde_json::json!({ "amount": entry.amount, "source_key": source_key }),
            );
            tracing::info!(
                owner_id,
                source_key,
                amount = entry.amount,
                tier = entry.tier,
                "Wallet award credited"
            );
        } else {
            tracing::debug!(owner_id, source_key, "Duplicate award replayed as no-op");
        }

        Ok(AwardResult {
            amount: entry.amount,
            new_balance,
            already_claimed: !inserted,
        })
    }

    /// Current balance; ≥ 0 by construction
    pub async fn balance(&self, owner_id: i64) -> AppResult<f64> {
        let mut conn = self.pool.acquire().await?;
        Ok(wallet::balance(&mut conn, owner_id).await?)
    }

    /// Balance with the shopper's current loyalty standing
    pub async fn profile(&self, owner_id: i64) -> AppResult<WalletProfile> {
        let mut conn = self.pool.acquire().await?;
        let points = shopper::engagement_points(&mut conn, owner_id).await?;
        let ladder = loyalty::all_tiers(&mut conn).await?;
        let tier = tiers::resolve_tier(points, &ladder);
        let balance = wallet::balance(&mut conn, owner_id).await?;
        Ok(WalletProfile {
            balance,
            tier: tier.tier,
            multiplier: tier.multiplier,
            engagement_points: points,
        })
    }

    /// Recent ledger entries, newest first
    pub async fn recent_entries(&self, owner_id: i64) -> AppResult<Vec<WalletLedgerEntry>> {
        Ok(wallet::recent_entries(&self.pool, owner_id, LEDGER_HISTORY_LIMIT).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{seed_shopper, test_pool, test_pool_concurrent};

    fn service(pool: SqlitePool) -> WalletService {
        WalletService::new(pool, NotificationService::new())
    }

    #[tokio::test]
    async fn test_award_applies_tier_multiplier() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 600).await; // tier 2: ×1.5
        let svc = service(pool);

        let result = svc.award(1, "diamond-42", 5.0).await.unwrap();
        assert!(!result.already_claimed);
        assert_eq!(result.amount, 7.5);
        assert_eq!(result.new_balance, 7.5);
    }

    #[tokio::test]
    async fn test_award_tier_one_by_default() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let svc = service(pool);

        let result = svc.award(1, "wheel-1", 10.0).await.unwrap();
        assert_eq!(result.amount, 10.0);
    }

    #[tokio::test]
    async fn test_duplicate_award_reports_original_amount() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 600).await;
        let svc = service(pool.clone());

        let first = svc.award(1, "diamond-42", 5.0).await.unwrap();
        assert_eq!(first.amount, 7.5);

        // Shopper crosses into tier 3 before the duplicate arrives; the
        // replay still reports the original 7.5, not a recomputed value
        sqlx::query("UPDATE shopper SET engagement_points = 5000 WHERE id = 1")
            .execute(&pool)
            .await
            .unwrap();

        let replay = svc.award(1, "diamond-42", 5.0).await.unwrap();
        assert!(replay.already_claimed);
        assert_eq!(replay.amount, 7.5);
        assert_eq!(replay.new_balance, 7.5);
    }

    #[tokio::test]
    async fn test_award_validation() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let svc = service(pool);

        assert!(svc.award(1, "", 5.0).await.is_err());
        assert!(svc.award(1, "k", 0.0).await.is_err());
        assert!(svc.award(1, "k", -5.0).await.is_err());
        assert!(svc.award(1, "k", f64::NAN).await.is_err());
    }

    #[tokio::test]
    async fn test_award_unknown_shopper_is_not_found() {
        let pool = test_pool().await;
        let svc = service(pool);
        let err = svc.award(99, "k", 5.0).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_awards_credit_exactly_once() {
        let (pool, _guard) = test_pool_concurrent().await;
        seed_shopper(&pool, 1, 600).await;
        let svc = service(pool);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.award(1, "diamond-42", 5.0).await.unwrap()
            }));
        }

        let mut fresh = 0;
        let mut replayed = 0;
        for handle in handles {
            let result = handle.await.unwrap();
            assert_eq!(result.amount, 7.5);
            if result.already_claimed {
                replayed += 1;
            } else {
                fresh += 1;
            }
        }
        assert_eq!(fresh, 1);
        assert_eq!(replayed, 7);

        assert_eq!(svc.balance(1).await.unwrap(), 7.5);
    }

    #[tokio::test]
    async fn test_profile_reflects_points_and_balance() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 2500).await; // tier 3
        let svc = service(pool);

        svc.award(1, "a", 5.0).await.unwrap(); // ×2.0 → 10
        let profile = svc.profile(1).await.unwrap();
        assert_eq!(profile.tier, 3);
        assert_eq!(profile.multiplier, 2.0);
        assert_eq!(profile.balance, 10.0);
        assert_eq!(profile.engagement_points, 2500);
    }

    #[tokio::test]
    async fn test_balance_never_negative_after_any_sequence() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let svc = service(pool.clone());

        svc.award(1, "a", 10.0).await.unwrap();

        // Spends clamp against the in-transaction balance
        let mut conn = pool.acquire().await.unwrap();
        for (key, requested) in [("s1", 6.0), ("s2", 6.0), ("s3", 100.0)] {
            crate::db::repository::wallet::spend_clamped(&mut conn, 1, key, requested, 1000.0, 0)
                .await
                .unwrap();
        }
        drop(conn);

        let balance = svc.balance(1).await.unwrap();
        assert!(balance >= 0.0);
        assert_eq!(balance, 0.0); // 10 − 6 − 4 − 0
    }
}
