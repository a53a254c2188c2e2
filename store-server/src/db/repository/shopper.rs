//! Shopper Repository

use super::{RepoError, RepoResult};
use shared::models::Shopper;
use sqlx::{SqliteConnection, SqlitePool};

const SHOPPER_SELECT: &str = "SELECT id, display_name, engagement_points, is_active, created_at, updated_at FROM shopper";

pub async fn create(pool: &SqlitePool, display_name: &str) -> RepoResult<Shopper> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO shopper (id, display_name, engagement_points, is_active, created_at, updated_at) VALUES (?1, ?2, 0, 1, ?3, ?3)",
    )
    .bind(id)
    .bind(display_name)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create shopper".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Shopper>> {
    let sql = format!("{} WHERE id = ?", SHOPPER_SELECT);
    let row = sqlx::query_as::<_, Shopper>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Engagement points read inside a caller-owned transaction, so tier
/// resolution and the ledger append commit together.
pub async fn engagement_points(conn: &mut SqliteConnection, id: i64) -> RepoResult<i64> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT engagement_points FROM shopper WHERE id = ? AND is_active = 1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
    row.map(|(p,)| p)
        .ok_or_else(|| RepoError::NotFound(format!("Shopper {id} not found")))
}

/// Atomically accrue engagement points after a confirmed checkout
pub async fn add_engagement_points(
    conn: &mut SqliteConnection,
    id: i64,
    points: i64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE shopper SET engagement_points = engagement_points + ?1, updated_at = ?2 WHERE id = ?3 AND is_active = 1",
    )
    .bind(points)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}
