use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{OrchardError, Result};
use crate::reward::{AppleTier, RewardInventory};

/// Visual milestone of the tree, serialized as its index `0..=4`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum TreeStage {
    #[default]
    Sapling,
    Red,
    Silver,
    Gold,
    Diamond,
}

impl TreeStage {
    #[must_use]
    pub const fn index(&self) -> u8 {
        match self {
            Self::Sapling => 0,
            Self::Red => 1,
            Self::Silver => 2,
            Self::Gold => 3,
            Self::Diamond => 4,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sapling => "sapling",
            Self::Red => "red",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Diamond => "diamond",
        }
    }

    pub fn from_index(index: u8) -> Result<Self> {
        match index {
            0 => Ok(Self::Sapling),
            1 => Ok(Self::Red),
            2 => Ok(Self::Silver),
            3 => Ok(Self::Gold),
            4 => Ok(Self::Diamond),
            other => Err(OrchardError::InvalidInput(format!(
                "tree stage must be within 0..=4, got {other}"
            ))),
        }
    }

    #[must_use]
    pub const fn from_tier(tier: AppleTier) -> Self {
        match tier {
            AppleTier::Red => Self::Red,
            AppleTier::Silver => Self::Silver,
            AppleTier::Gold => Self::Gold,
            AppleTier::Diamond => Self::Diamond,
        }
    }
}

impl Display for TreeStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for TreeStage {
    type Error = OrchardError;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_index(value)
    }
}

impl From<TreeStage> for u8 {
    fn from(stage: TreeStage) -> Self {
        stage.index()
    }
}

/// Stage of the tree for an inventory: the highest tier holding any apple.
#[must_use]
pub fn stage_of(inventory: &RewardInventory) -> TreeStage {
    if inventory.tier4_count > 0 {
        TreeStage::Diamond
    } else if inventory.tier3_count > 0 {
        TreeStage::Gold
    } else if inventory.tier2_count > 0 {
        TreeStage::Silver
    } else if inventory.tier1_count > 0 {
        TreeStage::Red
    } else {
        TreeStage::Sapling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::convert_points;

    #[test]
    fn only_zero_base_units_is_a_sapling() {
        assert_eq!(stage_of(&convert_points(0)), TreeStage::Sapling);
        assert_eq!(stage_of(&convert_points(9)), TreeStage::Sapling);
        assert_eq!(stage_of(&convert_points(10)), TreeStage::Red);
        assert_eq!(stage_of(&convert_points(50)), TreeStage::Silver);
        assert_eq!(stage_of(&convert_points(250)), TreeStage::Gold);
        assert_eq!(stage_of(&convert_points(1250)), TreeStage::Diamond);
    }

    #[test]
    fn stage_is_monotone_in_point_total() {
        let mut previous = TreeStage::Sapling;
        for points in 0..15_000 {
            let stage = stage_of(&convert_points(points));
            assert!(stage >= previous, "stage regressed at {points}");
            previous = stage;
        }
    }

    #[test]
    fn stage_agrees_with_highest_tier() {
        for points in (0..40_000).step_by(13) {
            let inventory = convert_points(points);
            let expected = inventory
                .highest_tier()
                .map_or(TreeStage::Sapling, TreeStage::from_tier);
            assert_eq!(stage_of(&inventory), expected);
        }
    }

    #[test]
    fn stage_serializes_as_index() {
        let json = serde_json::to_value(TreeStage::Gold).expect("serialize");
        assert_eq!(json, serde_json::json!(3));
        let parsed: TreeStage = serde_json::from_value(serde_json::json!(1)).expect("parse");
        assert_eq!(parsed, TreeStage::Red);
        assert!(serde_json::from_value::<TreeStage>(serde_json::json!(5)).is_err());
    }
}
