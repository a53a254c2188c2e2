//! Loyalty Tier Resolution
//!
//! Pure functions over the configured tier ladder. The ladder is read
//! inside the awarding transaction; resolution itself has no IO.

use shared::models::LoyaltyTier;

/// Fallback when no ladder is configured: everyone earns 1:1
fn base_tier() -> LoyaltyTier {
    LoyaltyTier {
        tier: 1,
        multiplier: 1.0,
        min_points: 0,
    }
}

/// Resolve the tier for a point count: the highest tier whose entry
/// threshold the shopper has reached.
pub fn resolve_tier(points: i64, ladder: &[LoyaltyTier]) -> LoyaltyTier {
    ladder
        .iter()
        .filter(|t| t.min_points <= points)
        .max_by_key(|t| t.min_points)
        .cloned()
        .unwrap_or_else(base_tier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> Vec<LoyaltyTier> {
        vec![
            LoyaltyTier { tier: 1, multiplier: 1.0, min_points: 0 },
            LoyaltyTier { tier: 2, multiplier: 1.5, min_points: 500 },
            LoyaltyTier { tier: 3, multiplier: 2.0, min_points: 2000 },
        ]
    }

    #[test]
    fn test_zero_points_is_tier_one() {
        let t = resolve_tier(0, &ladder());
        assert_eq!(t.tier, 1);
        assert_eq!(t.multiplier, 1.0);
    }

    #[test]
    fn test_exact_threshold_reaches_tier() {
        assert_eq!(resolve_tier(500, &ladder()).tier, 2);
        assert_eq!(resolve_tier(2000, &ladder()).tier, 3);
    }

    #[test]
    fn test_one_below_threshold_stays_down() {
        assert_eq!(resolve_tier(499, &ladder()).tier, 1);
        assert_eq!(resolve_tier(1999, &ladder()).tier, 2);
    }

    #[test]
    fn test_far_beyond_top_stays_top() {
        assert_eq!(resolve_tier(1_000_000, &ladder()).tier, 3);
    }

    #[test]
    fn test_empty_ladder_falls_back_to_base() {
        let t = resolve_tier(5000, &[]);
        assert_eq!(t.tier, 1);
        assert_eq!(t.multiplier, 1.0);
    }
}
