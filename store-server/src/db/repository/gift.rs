//! Gift Threshold Repository

use super::{RepoError, RepoResult};
use shared::models::GiftThreshold;
use sqlx::{SqliteConnection, SqlitePool};

const THRESHOLD_SELECT: &str = "SELECT id, threshold_amount, before_message, after_message, gift_name, is_active, created_at FROM gift_threshold";

/// The single threshold considered by the evaluator: active, smallest
/// amount, ties broken by insertion (id) order.
pub async fn active_threshold(
    conn: &mut SqliteConnection,
) -> RepoResult<Option<GiftThreshold>> {
    let sql = format!(
        "{} WHERE is_active = 1 ORDER BY threshold_amount ASC, id ASC LIMIT 1",
        THRESHOLD_SELECT
    );
    let row = sqlx::query_as::<_, GiftThreshold>(&sql)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    threshold_amount: f64,
    before_message: &str,
    after_message: &str,
    gift_name: &str,
    is_active: bool,
) -> RepoResult<GiftThreshold> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO gift_threshold (id, threshold_amount, before_message, after_message, gift_name, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(id)
    .bind(threshold_amount)
    .bind(before_message)
    .bind(after_message)
    .bind(gift_name)
    .bind(is_active)
    .bind(now)
    .execute(pool)
    .await?;

    let sql = format!("{} WHERE id = ?", THRESHOLD_SELECT);
    let row = sqlx::query_as::<_, GiftThreshold>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| RepoError::Database("Failed to create gift threshold".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::test_pool;

    #[tokio::test]
    async fn test_smallest_active_threshold_wins() {
        let pool = test_pool().await;
        create(&pool, 100.0, "b", "a", "Tote bag", true).await.unwrap();
        let small = create(&pool, 69.0, "b", "a", "Sticker pack", true).await.unwrap();
        create(&pool, 50.0, "b", "a", "Disabled", false).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let active = active_threshold(&mut conn).await.unwrap().unwrap();
        assert_eq!(active.id, small.id);
        assert_eq!(active.gift_name, "Sticker pack");
    }

    #[tokio::test]
    async fn test_no_active_threshold_is_none() {
        let pool = test_pool().await;
        create(&pool, 50.0, "b", "a", "Disabled", false).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        assert!(active_threshold(&mut conn).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_equal_amounts_tie_breaks_by_insertion() {
        let pool = test_pool().await;
        // Explicit ids: insertion order is id order
        for (id, name) in [(1_i64, "First"), (2_i64, "Second")] {
            sqlx::query(
                "INSERT INTO gift_threshold (id, threshold_amount, before_message, after_message, gift_name, is_active, created_at) VALUES (?1, 69.0, 'b', 'a', ?2, 1, 0)",
            )
            .bind(id)
            .bind(name)
            .execute(&pool)
            .await
            .unwrap();
        }

        let mut conn = pool.acquire().await.unwrap();
        let active = active_threshold(&mut conn).await.unwrap().unwrap();
        assert_eq!(active.gift_name, "First");
    }
}
