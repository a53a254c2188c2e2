//! Wallet Ledger Repository
//!
//! The ledger is append-only. `(owner_id, source_key)` uniqueness plus
//! `INSERT OR IGNORE` makes every append idempotent: a duplicate trigger
//! leaves the ledger untouched and the caller reads back the original row.

use super::{RepoError, RepoResult};
use shared::models::WalletLedgerEntry;
use sqlx::{SqliteConnection, SqlitePool};

const ENTRY_SELECT: &str = "SELECT id, owner_id, source_key, amount, base_amount, multiplier, tier, created_at FROM wallet_ledger";

/// Append an award entry, resolving the owner's loyalty tier inside the
/// same statement. One atomic write: the multiplier can never come from a
/// read superseded by a concurrent tier change, and concurrent duplicates
/// serialize on the `(owner, source_key)` unique index.
///
/// Returns false when the key already exists (idempotent replay), or when
/// the owner/tier subquery matched nothing; the caller disambiguates.
pub async fn insert_award_resolving_tier(
    conn: &mut SqliteConnection,
    owner_id: i64,
    source_key: &str,
    base_amount: f64,
    timestamp: i64,
) -> RepoResult<bool> {
    let id = shared::util::snowflake_id();
    let result = sqlx::query(
        "INSERT OR IGNORE INTO wallet_ledger (id, owner_id, source_key, amount, base_amount, multiplier, tier, created_at) \
         SELECT ?1, s.id, ?2, ROUND(?3 * lt.multiplier, 2), ?3, lt.multiplier, lt.tier, ?4 \
         FROM shopper s JOIN loyalty_tier lt ON lt.min_points <= s.engagement_points \
         WHERE s.id = ?5 AND s.is_active = 1 \
         ORDER BY lt.min_points DESC LIMIT 1",
    )
    .bind(id)
    .bind(source_key)
    .bind(base_amount)
    .bind(timestamp)
    .bind(owner_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Append a ledger entry; returns false when `(owner, source_key)` already
/// exists (idempotent replay).
#[allow(clippy::too_many_arguments)]
pub async fn insert_entry(
    conn: &mut SqliteConnection,
    owner_id: i64,
    source_key: &str,
    amount: f64,
    base_amount: f64,
    multiplier: f64,
    tier: i64,
    timestamp: i64,
) -> RepoResult<bool> {
    let id = shared::util::snowflake_id();
    let result = sqlx::query(
        "INSERT OR IGNORE INTO wallet_ledger (id, owner_id, source_key, amount, base_amount, multiplier, tier, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(id)
    .bind(owner_id)
    .bind(source_key)
    .bind(amount)
    .bind(base_amount)
    .bind(multiplier)
    .bind(tier)
    .bind(timestamp)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_entry(
    conn: &mut SqliteConnection,
    owner_id: i64,
    source_key: &str,
) -> RepoResult<Option<WalletLedgerEntry>> {
    let sql = format!("{} WHERE owner_id = ? AND source_key = ?", ENTRY_SELECT);
    let row = sqlx::query_as::<_, WalletLedgerEntry>(&sql)
        .bind(owner_id)
        .bind(source_key)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Current balance: sum of signed entries, 0 for an empty ledger
pub async fn balance(conn: &mut SqliteConnection, owner_id: i64) -> RepoResult<f64> {
    let row: (f64,) =
        sqlx::query_as("SELECT COALESCE(SUM(amount), 0.0) FROM wallet_ledger WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(conn)
            .await?;
    Ok(crate::money::round_amount(row.0))
}

/// Recent entries, newest first (bounded history view for the UI)
pub async fn recent_entries(
    pool: &SqlitePool,
    owner_id: i64,
    limit: i64,
) -> RepoResult<Vec<WalletLedgerEntry>> {
    let sql = format!(
        "{} WHERE owner_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        ENTRY_SELECT
    );
    let rows = sqlx::query_as::<_, WalletLedgerEntry>(&sql)
        .bind(owner_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Append a spend (negative) entry clamped to the balance read in this
/// same transaction. Returns the effective amount debited; 0 when nothing
/// could be applied. Idempotent on `source_key`: a retried commit returns
/// the originally debited amount.
pub async fn spend_clamped(
    conn: &mut SqliteConnection,
    owner_id: i64,
    source_key: &str,
    requested: f64,
    cap: f64,
    timestamp: i64,
) -> RepoResult<f64> {
    if let Some(existing) = find_entry(conn, owner_id, source_key).await? {
        // Retried commit: the debit already happened
        return Ok(crate::money::round_amount(-existing.amount));
    }

    let current = balance(conn, owner_id).await?;
    let effective = requested.min(current).min(cap).max(0.0);
    let effective = crate::money::round_amount(effective);
    if effective == 0.0 {
        return Ok(0.0);
    }

    let inserted = insert_entry(
        conn, owner_id, source_key, -effective, 0.0, 1.0, 0, timestamp,
    )
    .await?;
    if !inserted {
        return Err(RepoError::Conflict(format!(
            "wallet entry {owner_id}/{source_key} appeared mid-transaction"
        )));
    }
    Ok(effective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{seed_shopper, test_pool};

    #[tokio::test]
    async fn test_insert_entry_idempotent() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mut conn = pool.acquire().await.unwrap();

        let first = insert_entry(&mut conn, 1, "diamond-42", 7.5, 5.0, 1.5, 2, 1000)
            .await
            .unwrap();
        let second = insert_entry(&mut conn, 1, "diamond-42", 7.5, 5.0, 1.5, 2, 2000)
            .await
            .unwrap();
        assert!(first);
        assert!(!second);

        let entry = find_entry(&mut conn, 1, "diamond-42").await.unwrap().unwrap();
        assert_eq!(entry.amount, 7.5);
        assert_eq!(entry.created_at, 1000); // original row untouched
        assert_eq!(balance(&mut conn, 1).await.unwrap(), 7.5);
    }

    #[tokio::test]
    async fn test_insert_award_resolves_tier_in_statement() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 600).await; // tier 2 (×1.5) per seeded ladder
        let mut conn = pool.acquire().await.unwrap();

        let inserted = insert_award_resolving_tier(&mut conn, 1, "diamond-42", 5.0, 1000)
            .await
            .unwrap();
        assert!(inserted);

        let entry = find_entry(&mut conn, 1, "diamond-42").await.unwrap().unwrap();
        assert_eq!(entry.amount, 7.5);
        assert_eq!(entry.base_amount, 5.0);
        assert_eq!(entry.multiplier, 1.5);
        assert_eq!(entry.tier, 2);

        // Replay ignores, even after a tier change
        sqlx::query("UPDATE shopper SET engagement_points = 5000 WHERE id = 1")
            .execute(&mut *conn)
            .await
            .unwrap();
        let replay = insert_award_resolving_tier(&mut conn, 1, "diamond-42", 5.0, 2000)
            .await
            .unwrap();
        assert!(!replay);
        let entry = find_entry(&mut conn, 1, "diamond-42").await.unwrap().unwrap();
        assert_eq!(entry.amount, 7.5);
    }

    #[tokio::test]
    async fn test_insert_award_missing_shopper_inserts_nothing() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let inserted = insert_award_resolving_tier(&mut conn, 9, "k", 5.0, 1000)
            .await
            .unwrap();
        assert!(!inserted);
        assert!(find_entry(&mut conn, 9, "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_balance_empty_ledger_is_zero() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(balance(&mut conn, 1).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_spend_clamped_to_balance_and_cap() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mut conn = pool.acquire().await.unwrap();
        insert_entry(&mut conn, 1, "seed", 10.0, 10.0, 1.0, 1, 1000)
            .await
            .unwrap();

        // Requested 50, balance 10, cap 90 → 10
        let eff = spend_clamped(&mut conn, 1, "checkout:tx1", 50.0, 90.0, 2000)
            .await
            .unwrap();
        assert_eq!(eff, 10.0);
        assert_eq!(balance(&mut conn, 1).await.unwrap(), 0.0);

        // Balance never goes negative
        let eff = spend_clamped(&mut conn, 1, "checkout:tx2", 50.0, 90.0, 3000)
            .await
            .unwrap();
        assert_eq!(eff, 0.0);
        assert_eq!(balance(&mut conn, 1).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_spend_clamped_to_cart_total() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mut conn = pool.acquire().await.unwrap();
        insert_entry(&mut conn, 1, "seed", 100.0, 100.0, 1.0, 1, 1000)
            .await
            .unwrap();

        // Requested 80, balance 100, cap (cart) 30 → 30
        let eff = spend_clamped(&mut conn, 1, "checkout:tx1", 80.0, 30.0, 2000)
            .await
            .unwrap();
        assert_eq!(eff, 30.0);
        assert_eq!(balance(&mut conn, 1).await.unwrap(), 70.0);
    }

    #[tokio::test]
    async fn test_spend_retry_returns_original_amount() {
        let pool = test_pool().await;
        seed_shopper(&pool, 1, 0).await;
        let mut conn = pool.acquire().await.unwrap();
        insert_entry(&mut conn, 1, "seed", 40.0, 40.0, 1.0, 1, 1000)
            .await
            .unwrap();

        let first = spend_clamped(&mut conn, 1, "checkout:tx9", 25.0, 100.0, 2000)
            .await
            .unwrap();
        let retry = spend_clamped(&mut conn, 1, "checkout:tx9", 25.0, 100.0, 3000)
            .await
            .unwrap();
        assert_eq!(first, 25.0);
        assert_eq!(retry, 25.0);
        // Only one debit recorded
        assert_eq!(balance(&mut conn, 1).await.unwrap(), 15.0);
    }
}
