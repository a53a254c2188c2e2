//! Loyalty Tier Repository

use super::RepoResult;
use shared::models::LoyaltyTier;
use sqlx::SqliteConnection;

/// All configured tiers, ascending by entry threshold.
///
/// Read inside the awarding statement, never from a cached copy, so a
/// tier configuration change can never credit at a superseded multiplier.
pub async fn all_tiers(conn: &mut SqliteConnection) -> RepoResult<Vec<LoyaltyTier>> {
    let rows = sqlx::query_as::<_, LoyaltyTier>(
        "SELECT tier, multiplier, min_points FROM loyalty_tier ORDER BY min_points ASC",
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
