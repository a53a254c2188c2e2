//! Delivery Batch Repository
//!
//! Every state transition is a conditional write guarded by the current
//! status; callers learn from `rows_affected` whether they performed the
//! transition or lost a race, and re-read instead of reapplying.

use super::{RepoError, RepoResult};
use shared::models::{BatchStatus, DeliveryBatch};
use sqlx::{SqliteConnection, SqlitePool};

const BATCH_SELECT: &str = "SELECT id, owner_id, status, shipment_order_id, created_at, validate_at, validated_at, updated_at FROM delivery_batch";

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<DeliveryBatch>> {
    let sql = format!("{} WHERE id = ?", BATCH_SELECT);
    let row = sqlx::query_as::<_, DeliveryBatch>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn find_pending_by_owner(
    conn: &mut SqliteConnection,
    owner_id: i64,
) -> RepoResult<Option<DeliveryBatch>> {
    let sql = format!("{} WHERE owner_id = ? AND status = 'PENDING'", BATCH_SELECT);
    let row = sqlx::query_as::<_, DeliveryBatch>(&sql)
        .bind(owner_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Open a fresh pending batch.
///
/// The partial unique index on `(owner_id) WHERE status = 'PENDING'`
/// surfaces a concurrent open as `RepoError::Conflict`; the caller re-reads
/// and attaches to the winner.
pub async fn insert_pending(
    conn: &mut SqliteConnection,
    owner_id: i64,
    validate_at: i64,
    timestamp: i64,
) -> RepoResult<DeliveryBatch> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO delivery_batch (id, owner_id, status, created_at, validate_at, updated_at) VALUES (?1, ?2, 'PENDING', ?3, ?4, ?3)",
    )
    .bind(id)
    .bind(owner_id)
    .bind(timestamp)
    .bind(validate_at)
    .execute(&mut *conn)
    .await?;
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create batch".into()))
}

/// `pending → expired`; false when the batch was no longer pending
pub async fn mark_expired(
    conn: &mut SqliteConnection,
    id: i64,
    timestamp: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE delivery_batch SET status = 'EXPIRED', updated_at = ?1 WHERE id = ?2 AND status = 'PENDING'",
    )
    .bind(timestamp)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// `pending → validated` with the shipment order id, in one write.
/// False when another caller already finalized (or the batch left pending).
pub async fn mark_validated(
    conn: &mut SqliteConnection,
    id: i64,
    shipment_order_id: i64,
    timestamp: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE delivery_batch SET status = 'VALIDATED', shipment_order_id = ?1, validated_at = ?2, updated_at = ?2 WHERE id = ?3 AND status = 'PENDING'",
    )
    .bind(shipment_order_id)
    .bind(timestamp)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// `pending → cancelled`; false when the batch was no longer pending
pub async fn mark_cancelled(
    conn: &mut SqliteConnection,
    id: i64,
    timestamp: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE delivery_batch SET status = 'CANCELLED', updated_at = ?1 WHERE id = ?2 AND status = 'PENDING'",
    )
    .bind(timestamp)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Expiry sweep: flip every stale pending batch in one statement.
/// Returns `(batch_id, owner_id)` pairs for advisory notifications.
pub async fn sweep_expired(pool: &SqlitePool, now: i64) -> RepoResult<Vec<(i64, i64)>> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "UPDATE delivery_batch SET status = 'EXPIRED', updated_at = ?1 WHERE status = 'PENDING' AND validate_at <= ?1 RETURNING id, owner_id",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Count batches in a given status
pub async fn count_by_status(pool: &SqlitePool, status: BatchStatus) -> RepoResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM delivery_batch WHERE status = ?")
        .bind(status)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
