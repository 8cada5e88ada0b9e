use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::growth::{GrowthAccrual, GrowthState};
use crate::reward::{RewardInventory, convert_points};
use crate::reconcile::ProgressView;
use crate::store::{AccountStore, ProfileCounters, StoreRevisions, TreeRow};
use crate::tree::{TreeStage, stage_of};

mod achievement_service;
mod completion_service;

pub use completion_service::{SessionOutcome, TaskOutcome};

/// Progress as the client renders it. Inventory and stage are always
/// recomputed from the point total, never read from cached tree columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub point_total: u64,
    pub inventory: RewardInventory,
    pub stage: TreeStage,
    pub growth_level: u32,
    #[serde(default)]
    pub growth_carry: u64,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn from_rows(profile: &ProfileCounters, tree: &TreeRow) -> Self {
        Self::project(
            profile.point_total,
            GrowthState {
                level: tree.growth_level,
                carry: tree.growth_carry,
            },
        )
    }

    pub(crate) fn project(point_total: u64, growth: GrowthState) -> Self {
        let inventory = convert_points(point_total);
        Self {
            point_total,
            inventory,
            stage: stage_of(&inventory),
            growth_level: growth.level,
            growth_carry: growth.carry,
        }
    }

    /// Optimistic projection after one scored event, pending store confirmation.
    #[must_use]
    pub fn predict(&self, accrual: GrowthAccrual, event_points: u64) -> Prediction {
        let growth = GrowthState {
            level: self.growth_level,
            carry: self.growth_carry,
        }
        .accrue(accrual, event_points);
        Prediction {
            event_points,
            snapshot: Self::project(self.point_total.saturating_add(event_points), growth),
            based_on: StoreRevisions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub event_points: u64,
    pub snapshot: ProgressSnapshot,
    /// Store revisions the prediction was projected from. Only snapshots
    /// newer than these can confirm it.
    #[serde(default)]
    pub based_on: StoreRevisions,
}

/// Client-side entry point over an injected account store.
#[derive(Clone)]
pub struct Orchard {
    store: Arc<dyn AccountStore>,
    config: EngineConfig,
}

impl std::fmt::Debug for Orchard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchard")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Orchard {
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    fn read_rows(&self, user_id: &str) -> Result<(ProfileCounters, TreeRow)> {
        Ok((
            self.store.profile_counters(user_id)?,
            self.store.tree_row(user_id)?,
        ))
    }

    pub fn progress(&self, user_id: &str) -> Result<ProgressSnapshot> {
        let (profile, tree) = self.read_rows(user_id)?;
        let snapshot = ProgressSnapshot::from_rows(&profile, &tree);
        tracing::debug!(
            user_id,
            point_total = snapshot.point_total,
            stage = %snapshot.stage,
            growth_level = snapshot.growth_level,
            "progress projected"
        );
        Ok(snapshot)
    }

    /// Start a feed view from a fresh read. Snapshots at or below the
    /// revisions of that read are ignored.
    pub fn progress_view(&self, user_id: &str) -> Result<ProgressView> {
        let (profile, tree) = self.read_rows(user_id)?;
        Ok(ProgressView::new(
            user_id,
            ProgressSnapshot::from_rows(&profile, &tree),
            StoreRevisions::of(&profile, &tree),
        ))
    }

    pub(crate) fn predict(&self, user_id: &str, event_points: u64) -> Result<Prediction> {
        let (profile, tree) = self.read_rows(user_id)?;
        let mut prediction = ProgressSnapshot::from_rows(&profile, &tree)
            .predict(self.config.growth_accrual, event_points);
        prediction.based_on = StoreRevisions::of(&profile, &tree);
        Ok(prediction)
    }
}
