//! Boundary to the hosted account and session store.
//!
//! The store owns every durable record and performs the authoritative point,
//! growth and streak accrual. The engine only reads snapshots through
//! [`AccountStore`] and listens for full-row change notifications.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::achievement::CounterSnapshot;
use crate::catalog::{AchievementDefinition, UnlockRecord};
use crate::error::Result;
use crate::scoring::SessionKind;
use crate::stats::{CompletedSession, CompletedTask};

mod memory;


pub use memory::MemoryStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCounters {
    /// Store revision this row was read at.
    #[serde(default)]
    pub revision: u64,
    pub point_total: u64,
    pub current_streak_days: u64,
    pub longest_streak_days: u64,
    #[serde(default)]
    pub last_point_earned_date: Option<NaiveDate>,
    #[serde(default)]
    pub streak_popup_shown_date: Option<NaiveDate>,
}

/// Cached tree columns as the store holds them. Only `growth_level` and
/// `growth_carry` are authoritative; tier counts are recomputed from the
/// point total on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRow {
    #[serde(default)]
    pub revision: u64,
    pub growth_level: u32,
    #[serde(default)]
    pub growth_carry: u64,
    #[serde(default)]
    pub total_base_units: u64,
    #[serde(default)]
    pub tier1_count: u64,
    #[serde(default)]
    pub tier2_count: u64,
    #[serde(default)]
    pub tier3_count: u64,
    #[serde(default)]
    pub tier4_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCompletion {
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub kind: SessionKind,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    Profiles,
    Trees,
}

/// Full-row snapshot pushed by the change feed after a mutation.
///
/// Feeds may duplicate or reorder notifications, so consumers compare
/// `revision` and replace state wholesale instead of applying deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum ChangeEvent {
    Profiles {
        user_id: String,
        revision: u64,
        row: ProfileCounters,
    },
    Trees {
        user_id: String,
        revision: u64,
        row: TreeRow,
    },
}

impl ChangeEvent {
    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::Profiles { user_id, .. } | Self::Trees { user_id, .. } => user_id,
        }
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        match self {
            Self::Profiles { revision, .. } | Self::Trees { revision, .. } => *revision,
        }
    }

    #[must_use]
    pub const fn table(&self) -> ChangeTable {
        match self {
            Self::Profiles { .. } => ChangeTable::Profiles,
            Self::Trees { .. } => ChangeTable::Trees,
        }
    }
}

/// Revisions of the profile and tree rows a read was taken at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRevisions {
    pub profile: u64,
    pub tree: u64,
}

impl StoreRevisions {
    #[must_use]
    pub const fn of(profile: &ProfileCounters, tree: &TreeRow) -> Self {
        Self {
            profile: profile.revision,
            tree: tree.revision,
        }
    }
}

pub type ChangeListener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

pub trait AccountStore: Send + Sync {
    fn profile_counters(&self, user_id: &str) -> Result<ProfileCounters>;

    fn tree_row(&self, user_id: &str) -> Result<TreeRow>;

    /// Record a finished session. Point accrual, streak upkeep and any
    /// week-boundary split happen on the store side.
    fn record_session_completion(&self, completion: &SessionCompletion) -> Result<()>;

    /// Mark a task completed and return the points it awarded.
    fn record_task_completion(
        &self,
        user_id: &str,
        task_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<u64>;

    fn achievement_counters(&self, user_id: &str, today: NaiveDate) -> Result<CounterSnapshot>;

    fn achievement_definitions(&self) -> Result<Vec<AchievementDefinition>>;

    fn unlocked_achievements(&self, user_id: &str) -> Result<Vec<UnlockRecord>>;

    fn completed_sessions(&self, user_id: &str) -> Result<Vec<CompletedSession>>;

    /// Completed tasks in completion order.
    fn completed_tasks(&self, user_id: &str) -> Result<Vec<CompletedTask>>;

    fn subscribe(&self, user_id: &str, listener: ChangeListener) -> Result<SubscriptionId>;

    fn unsubscribe(&self, id: SubscriptionId) -> Result<bool>;
}
