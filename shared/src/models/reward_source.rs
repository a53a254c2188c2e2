//! Reward Source Configuration
//!
//! Each promotional mechanism carries its own settings shape; the kinds are
//! a tagged variant instead of duck-typed rows. At most one mechanism is
//! active at a time; the activation primitive enforces that transactionally.

use serde::{Deserialize, Serialize};

/// Per-mechanism settings, tagged by kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardSourceSettings {
    /// Cumulative-spend gift unlock (drives the Gift Threshold Evaluator)
    GiftThreshold { threshold_id: i64 },
    /// Scratch-card game: each card awards a fixed base amount
    ScratchCard { base_amount: f64, daily_limit: i64 },
    /// Prize wheel: weighted base amounts
    Wheel { base_amounts: Vec<f64> },
}

impl RewardSourceSettings {
    /// Stable kind discriminant, also the DB `kind` column value
    pub fn kind(&self) -> &'static str {
        match self {
            RewardSourceSettings::GiftThreshold { .. } => "gift_threshold",
            RewardSourceSettings::ScratchCard { .. } => "scratch_card",
            RewardSourceSettings::Wheel { .. } => "wheel",
        }
    }
}

/// Reward source configuration row
///
/// `settings` round-trips through a JSON column; `kind` is denormalized for
/// querying without parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardSourceConfig {
    pub id: i64,
    pub settings: RewardSourceSettings,
    pub is_active: bool,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_tagged_json() {
        let s = RewardSourceSettings::ScratchCard {
            base_amount: 5.0,
            daily_limit: 3,
        };
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"kind\":\"scratch_card\""));
        let back: RewardSourceSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn kind_matches_variant() {
        let s = RewardSourceSettings::GiftThreshold { threshold_id: 1 };
        assert_eq!(s.kind(), "gift_threshold");
    }
}
