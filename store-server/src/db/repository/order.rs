//! Store Order Repository

use super::{RepoError, RepoResult};
use shared::models::{OrderInput, OrderStatus, StoreOrder};
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_SELECT: &str = "SELECT id, owner_id, batch_id, total, status, payment_ref, created_at, updated_at FROM store_order";

/// SQL filter excluding statuses that never count toward cumulative sums.
/// Built from [`OrderStatus::EXCLUDED`] so SQL and in-memory filtering
/// cannot drift.
fn counted_filter() -> String {
    let quoted: Vec<String> = OrderStatus::EXCLUDED
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect();
    format!("status NOT IN ({})", quoted.join(", "))
}

/// Upsert an order and attach it to a batch.
///
/// The order row may already exist (created by a confirmed checkout, or a
/// re-attach after a batch replacement); attach then just repoints
/// `batch_id` and refreshes total/status.
pub async fn attach(
    conn: &mut SqliteConnection,
    owner_id: i64,
    order: &OrderInput,
    batch_id: i64,
    timestamp: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO store_order (id, owner_id, batch_id, total, status, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) \
         ON CONFLICT(id) DO UPDATE SET batch_id = excluded.batch_id, total = excluded.total, status = excluded.status, updated_at = excluded.updated_at",
    )
    .bind(order.id)
    .bind(owner_id)
    .bind(batch_id)
    .bind(order.total)
    .bind(order.status)
    .bind(timestamp)
    .execute(conn)
    .await?;
    Ok(())
}

/// Record a paid order produced by a confirmed checkout.
///
/// Keyed by `payment_ref`: a retried commit for the same transaction finds
/// the original row instead of creating a second order.
pub async fn insert_paid(
    conn: &mut SqliteConnection,
    owner_id: i64,
    total: f64,
    payment_ref: &str,
    timestamp: i64,
) -> RepoResult<(StoreOrder, bool)> {
    let id = shared::util::snowflake_id();
    let result = sqlx::query(
        "INSERT OR IGNORE INTO store_order (id, owner_id, batch_id, total, status, payment_ref, created_at, updated_at) \
         VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(id)
    .bind(owner_id)
    .bind(total)
    .bind(OrderStatus::Paid)
    .bind(payment_ref)
    .bind(timestamp)
    .execute(&mut *conn)
    .await?;
    let inserted = result.rows_affected() > 0;

    let order = find_by_payment_ref(conn, payment_ref)
        .await?
        .ok_or_else(|| RepoError::Database(format!("Paid order {payment_ref} vanished")))?;
    Ok((order, inserted))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<StoreOrder>> {
    let sql = format!("{} WHERE id = ?", ORDER_SELECT);
    let row = sqlx::query_as::<_, StoreOrder>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_payment_ref(
    conn: &mut SqliteConnection,
    payment_ref: &str,
) -> RepoResult<Option<StoreOrder>> {
    let sql = format!("{} WHERE payment_ref = ?", ORDER_SELECT);
    let row = sqlx::query_as::<_, StoreOrder>(&sql)
        .bind(payment_ref)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Sum of order totals attached to a batch, excluding cancelled / failed /
/// refunded orders.
pub async fn sum_for_batch(conn: &mut SqliteConnection, batch_id: i64) -> RepoResult<f64> {
    let sql = format!(
        "SELECT COALESCE(SUM(total), 0.0) FROM store_order WHERE batch_id = ? AND {}",
        counted_filter()
    );
    let row: (f64,) = sqlx::query_as(&sql).bind(batch_id).fetch_one(conn).await?;
    Ok(crate::money::round_amount(row.0))
}
