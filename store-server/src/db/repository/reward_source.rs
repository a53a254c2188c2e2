//! Reward Source Repository
//!
//! Promotional mechanisms (gift threshold, scratch card, wheel) each carry
//! their own settings shape; at most one is active. Activation deactivates
//! the rest inside one transaction, so concurrent administrative toggles
//! cannot leave two mechanisms enabled.

use super::{RepoError, RepoResult};
use shared::models::{RewardSourceConfig, RewardSourceSettings};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn row_to_config(row: &SqliteRow) -> RepoResult<RewardSourceConfig> {
    let settings_json: String = row.try_get("settings").map_err(RepoError::from)?;
    let settings: RewardSourceSettings = serde_json::from_str(&settings_json)
        .map_err(|e| RepoError::Database(format!("Corrupt reward source settings: {e}")))?;
    Ok(RewardSourceConfig {
        id: row.try_get("id").map_err(RepoError::from)?,
        settings,
        is_active: row.try_get("is_active").map_err(RepoError::from)?,
        updated_at: row.try_get("updated_at").map_err(RepoError::from)?,
    })
}

pub async fn insert(
    pool: &SqlitePool,
    settings: &RewardSourceSettings,
) -> RepoResult<RewardSourceConfig> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    let json = serde_json::to_string(settings)
        .map_err(|e| RepoError::Validation(format!("Unserializable settings: {e}")))?;
    sqlx::query(
        "INSERT INTO reward_source_config (id, kind, settings, is_active, updated_at) VALUES (?1, ?2, ?3, 0, ?4)",
    )
    .bind(id)
    .bind(settings.kind())
    .bind(json)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create reward source".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<RewardSourceConfig>> {
    let row = sqlx::query(
        "SELECT id, kind, settings, is_active, updated_at FROM reward_source_config WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(row_to_config).transpose()
}

pub async fn find_active(pool: &SqlitePool) -> RepoResult<Option<RewardSourceConfig>> {
    let row = sqlx::query(
        "SELECT id, kind, settings, is_active, updated_at FROM reward_source_config WHERE is_active = 1 LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(row_to_config).transpose()
}

/// Activate one mechanism, deactivating all others atomically
pub async fn activate_exclusive(pool: &SqlitePool, id: i64) -> RepoResult<RewardSourceConfig> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    sqlx::query("UPDATE reward_source_config SET is_active = 0, updated_at = ?1 WHERE is_active = 1")
        .bind(now)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("UPDATE reward_source_config SET is_active = 1, updated_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Reward source {id} not found")));
    }

    tx.commit().await.map_err(RepoError::from)?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Activated reward source vanished".into()))
}
