//! Point total to apple inventory conversion.
//!
//! Every ten points buy one base unit (a red apple). Base units are then
//! packed greedily into the four apple tiers, each tier worth five of the
//! tier below it.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OrchardError, Result};

pub const POINTS_PER_BASE_UNIT: u64 = 10;
pub const TIER_RATIO: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppleTier {
    Red,
    Silver,
    Gold,
    Diamond,
}

impl AppleTier {
    pub const ALL: [Self; 4] = [Self::Red, Self::Silver, Self::Gold, Self::Diamond];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Diamond => "diamond",
        }
    }

    /// Number of base units one apple of this tier stands for.
    #[must_use]
    pub const fn base_unit_weight(&self) -> u64 {
        match self {
            Self::Red => 1,
            Self::Silver => TIER_RATIO,
            Self::Gold => TIER_RATIO * TIER_RATIO,
            Self::Diamond => TIER_RATIO * TIER_RATIO * TIER_RATIO,
        }
    }
}

impl Display for AppleTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppleTier {
    type Err = OrchardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "diamond" => Ok(Self::Diamond),
            other => Err(OrchardError::InvalidInput(format!(
                "unknown apple tier: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewardInventory {
    pub total_base_units: u64,
    pub tier1_count: u64,
    pub tier2_count: u64,
    pub tier3_count: u64,
    pub tier4_count: u64,
}

impl RewardInventory {
    /// Build an inventory from raw tier counts.
    ///
    /// The counts must be a canonical greedy decomposition: tiers 1-3 each
    /// hold fewer than five apples.
    pub fn from_counts(tier1: u64, tier2: u64, tier3: u64, tier4: u64) -> Result<Self> {
        for (rank, count) in [(1, tier1), (2, tier2), (3, tier3)] {
            if count >= TIER_RATIO {
                return Err(OrchardError::InvalidInput(format!(
                    "tier{rank} count {count} is not canonical (must be below {TIER_RATIO})"
                )));
            }
        }
        let total_base_units = tier4
            .checked_mul(AppleTier::Diamond.base_unit_weight())
            .and_then(|units| units.checked_add(tier3 * AppleTier::Gold.base_unit_weight()))
            .and_then(|units| units.checked_add(tier2 * AppleTier::Silver.base_unit_weight()))
            .and_then(|units| units.checked_add(tier1))
            .ok_or_else(|| OrchardError::InvalidInput("tier counts overflow".to_string()))?;
        Ok(Self {
            total_base_units,
            tier1_count: tier1,
            tier2_count: tier2,
            tier3_count: tier3,
            tier4_count: tier4,
        })
    }

    #[must_use]
    pub const fn count(&self, tier: AppleTier) -> u64 {
        match tier {
            AppleTier::Red => self.tier1_count,
            AppleTier::Silver => self.tier2_count,
            AppleTier::Gold => self.tier3_count,
            AppleTier::Diamond => self.tier4_count,
        }
    }

    /// Weighted sum of the tier counts.
    #[must_use]
    pub const fn weighted_base_units(&self) -> u64 {
        self.tier1_count
            + self.tier2_count * TIER_RATIO
            + self.tier3_count * TIER_RATIO * TIER_RATIO
            + self.tier4_count * TIER_RATIO * TIER_RATIO * TIER_RATIO
    }

    /// Highest tier with at least one apple.
    #[must_use]
    pub fn highest_tier(&self) -> Option<AppleTier> {
        AppleTier::ALL
            .into_iter()
            .rev()
            .find(|tier| self.count(*tier) > 0)
    }
}

/// Convert an accumulated point total into its apple inventory.
///
/// Negative totals are rejected rather than clamped.
pub fn convert(point_total: i64) -> Result<RewardInventory> {
    let points = u64::try_from(point_total)
        .map_err(|_| OrchardError::negative("point_total", point_total))?;
    Ok(convert_points(points))
}

/// Infallible form of [`convert`] for totals already known to be non-negative.
#[must_use]
pub const fn convert_points(points: u64) -> RewardInventory {
    let base_units = points / POINTS_PER_BASE_UNIT;
    let tier4 = base_units / 125;
    let remaining_after_tier4 = base_units - tier4 * 125;
    let tier3 = remaining_after_tier4 / 25;
    let remaining_after_tier3 = remaining_after_tier4 - tier3 * 25;
    let tier2 = remaining_after_tier3 / 5;
    let tier1 = remaining_after_tier3 % 5;
    RewardInventory {
        total_base_units: base_units,
        tier1_count: tier1,
        tier2_count: tier2,
        tier3_count: tier3,
        tier4_count: tier4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(inventory: RewardInventory) -> (u64, u64, u64, u64) {
        (
            inventory.tier1_count,
            inventory.tier2_count,
            inventory.tier3_count,
            inventory.tier4_count,
        )
    }

    #[test]
    fn boundary_totals_convert_to_expected_tiers() {
        assert_eq!(counts(convert(0).expect("0")), (0, 0, 0, 0));
        assert_eq!(counts(convert(9).expect("9")), (0, 0, 0, 0));
        assert_eq!(counts(convert(10).expect("10")), (1, 0, 0, 0));
        assert_eq!(counts(convert(59).expect("59")), (0, 1, 0, 0));
        assert_eq!(counts(convert(1250).expect("1250")), (0, 0, 0, 1));
        assert_eq!(counts(convert(1259).expect("1259")), (0, 0, 0, 1));
        assert_eq!(convert(1259).expect("1259").total_base_units, 125);
    }

    #[test]
    fn mixed_total_uses_every_tier() {
        // 1564 points -> 156 base units = 1*125 + 1*25 + 1*5 + 1
        let inventory = convert(1564).expect("convert");
        assert_eq!(counts(inventory), (1, 1, 1, 1));
        assert_eq!(inventory.total_base_units, 156);
    }

    #[test]
    fn negative_total_is_rejected() {
        let err = convert(-1).expect_err("negative must fail");
        assert!(matches!(err, OrchardError::InvalidInput(_)));
    }

    #[test]
    fn weighted_sum_recovers_base_units() {
        for points in (0..20_000).step_by(7) {
            let inventory = convert_points(points);
            assert_eq!(inventory.weighted_base_units(), points / 10, "points={points}");
            assert!(inventory.tier1_count < 5);
            assert!(inventory.tier2_count < 5);
            assert!(inventory.tier3_count < 5);
        }
    }

    #[test]
    fn conversion_is_deterministic() {
        assert_eq!(convert(987_654).expect("a"), convert(987_654).expect("b"));
    }

    #[test]
    fn from_counts_rejects_non_canonical_counts() {
        assert!(RewardInventory::from_counts(5, 0, 0, 0).is_err());
        assert!(RewardInventory::from_counts(0, 0, 7, 0).is_err());
        let inventory = RewardInventory::from_counts(2, 1, 0, 3).expect("canonical");
        assert_eq!(inventory.total_base_units, 2 + 5 + 375);
        assert_eq!(inventory, convert_points(3820));
    }

    #[test]
    fn highest_tier_tracks_largest_nonzero_count() {
        assert_eq!(convert_points(0).highest_tier(), None);
        assert_eq!(convert_points(40).highest_tier(), Some(AppleTier::Red));
        assert_eq!(convert_points(260).highest_tier(), Some(AppleTier::Gold));
    }

    #[test]
    fn tier_names_parse_case_insensitively() {
        assert_eq!("Gold".parse::<AppleTier>().expect("gold"), AppleTier::Gold);
        assert!("bronze".parse::<AppleTier>().is_err());
    }
}
