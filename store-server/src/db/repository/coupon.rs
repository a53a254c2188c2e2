//! Coupon Repository
//!
//! Vouchers are single-use; `consume` is a conditional update that only
//! flips `is_used` from 0 to 1, so a retried commit is a no-op instead of a
//! double-mark or an error.

use super::{RepoError, RepoResult};
use shared::models::{AvailableCoupon, CouponSelection, CouponType, DiscountKind};
use sqlx::{SqliteConnection, SqlitePool};

const AVAILABLE_SELECT: &str = "SELECT uc.id, uc.owner_id, uc.coupon_type_id, ct.code, ct.discount_kind, ct.value, uc.is_used, uc.valid_until \
    FROM user_coupon uc JOIN coupon_type ct ON uc.coupon_type_id = ct.id";

/// Unused, unexpired vouchers of one owner, soonest-expiring first
pub async fn list_available(
    pool: &SqlitePool,
    owner_id: i64,
    now: i64,
) -> RepoResult<Vec<AvailableCoupon>> {
    let sql = format!(
        "{} WHERE uc.owner_id = ?1 AND uc.is_used = 0 AND uc.valid_until > ?2 AND ct.valid_from <= ?2 ORDER BY uc.valid_until ASC",
        AVAILABLE_SELECT
    );
    let rows = sqlx::query_as::<_, AvailableCoupon>(&sql)
        .bind(owner_id)
        .bind(now)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// One voucher, only if it belongs to the owner and is still usable.
/// The usability re-check inside the committing transaction is what makes
/// a stale selection harmless.
pub async fn find_usable(
    conn: &mut SqliteConnection,
    owner_id: i64,
    user_coupon_id: i64,
    now: i64,
) -> RepoResult<Option<AvailableCoupon>> {
    let sql = format!(
        "{} WHERE uc.id = ?1 AND uc.owner_id = ?2 AND uc.is_used = 0 AND uc.valid_until > ?3 AND ct.valid_from <= ?3",
        AVAILABLE_SELECT
    );
    let row = sqlx::query_as::<_, AvailableCoupon>(&sql)
        .bind(user_coupon_id)
        .bind(owner_id)
        .bind(now)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Conditional consume; false when the voucher was already used (benign)
pub async fn consume(
    conn: &mut SqliteConnection,
    user_coupon_id: i64,
    timestamp: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE user_coupon SET is_used = 1, used_at = ?1 WHERE id = ?2 AND is_used = 0",
    )
    .bind(timestamp)
    .bind(user_coupon_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Replace-on-select: the new voucher becomes the sole applied coupon
pub async fn select(
    pool: &SqlitePool,
    owner_id: i64,
    user_coupon_id: i64,
    timestamp: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO coupon_selection (owner_id, user_coupon_id, selected_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(owner_id) DO UPDATE SET user_coupon_id = excluded.user_coupon_id, selected_at = excluded.selected_at",
    )
    .bind(owner_id)
    .bind(user_coupon_id)
    .bind(timestamp)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn deselect(pool: &SqlitePool, owner_id: i64) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM coupon_selection WHERE owner_id = ?")
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_selection(
    conn: &mut SqliteConnection,
    owner_id: i64,
) -> RepoResult<Option<CouponSelection>> {
    let row = sqlx::query_as::<_, CouponSelection>(
        "SELECT owner_id, user_coupon_id, selected_at FROM coupon_selection WHERE owner_id = ?",
    )
    .bind(owner_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Clear a selection only if it still points at the given voucher
pub async fn clear_selection_of(
    conn: &mut SqliteConnection,
    owner_id: i64,
    user_coupon_id: i64,
) -> RepoResult<()> {
    sqlx::query("DELETE FROM coupon_selection WHERE owner_id = ?1 AND user_coupon_id = ?2")
        .bind(owner_id)
        .bind(user_coupon_id)
        .execute(conn)
        .await?;
    Ok(())
}

// ========== Template / grant management (admin tooling and tests) ==========

pub async fn create_type(
    pool: &SqlitePool,
    code: &str,
    discount_kind: DiscountKind,
    value: f64,
    valid_from: i64,
    valid_until: i64,
) -> RepoResult<CouponType> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO coupon_type (id, code, discount_kind, value, valid_from, valid_until) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(id)
    .bind(code)
    .bind(discount_kind)
    .bind(value)
    .bind(valid_from)
    .bind(valid_until)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, CouponType>(
        "SELECT id, code, discount_kind, value, valid_from, valid_until FROM coupon_type WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.ok_or_else(|| RepoError::Database("Failed to create coupon type".into()))
}

pub async fn grant(
    pool: &SqlitePool,
    owner_id: i64,
    coupon_type_id: i64,
    valid_until: i64,
) -> RepoResult<i64> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO user_coupon (id, owner_id, coupon_type_id, is_used, valid_until, created_at) VALUES (?1, ?2, ?3, 0, ?4, ?5)",
    )
    .bind(id)
    .bind(owner_id)
    .bind(coupon_type_id)
    .bind(valid_until)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}
