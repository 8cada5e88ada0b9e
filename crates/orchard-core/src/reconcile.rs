//! Merging optimistic predictions with the store's change feed.

use serde::{Deserialize, Serialize};

use crate::client::{Prediction, ProgressSnapshot};
use crate::growth::GrowthState;
use crate::store::{ChangeEvent, StoreRevisions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct PendingPrediction {
    prediction: Prediction,
    profile_revision: u64,
    tree_revision: u64,
}

/// One user's displayed progress.
///
/// Confirmed state only moves forward by store revision. A prediction is
/// layered on top until both tables have delivered a newer snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    user_id: String,
    confirmed: ProgressSnapshot,
    profile_revision: u64,
    tree_revision: u64,
    pending: Option<PendingPrediction>,
}

impl ProgressView {
    /// `revisions` are the store revisions `confirmed` was read at.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        confirmed: ProgressSnapshot,
        revisions: StoreRevisions,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            confirmed,
            profile_revision: revisions.profile,
            tree_revision: revisions.tree,
            pending: None,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub const fn confirmed(&self) -> &ProgressSnapshot {
        &self.confirmed
    }

    #[must_use]
    pub fn pending(&self) -> Option<&Prediction> {
        self.pending.as_ref().map(|pending| &pending.prediction)
    }

    /// What the client should render right now.
    #[must_use]
    pub fn displayed(&self) -> &ProgressSnapshot {
        self.pending
            .as_ref()
            .map_or(&self.confirmed, |pending| &pending.prediction.snapshot)
    }

    /// Layer a prediction over confirmed state. It settles once both tables
    /// move past the revisions it was projected from, or past the view's own
    /// revisions if those are newer.
    pub fn apply_prediction(&mut self, prediction: Prediction) {
        self.pending = Some(PendingPrediction {
            prediction,
            profile_revision: self.profile_revision.max(prediction.based_on.profile),
            tree_revision: self.tree_revision.max(prediction.based_on.tree),
        });
    }

    /// Fold one change-feed snapshot into the view. Returns whether it was
    /// accepted; foreign, duplicate and out-of-order snapshots are ignored.
    pub fn apply_snapshot(&mut self, event: &ChangeEvent) -> bool {
        if event.user_id() != self.user_id {
            return false;
        }
        match event {
            ChangeEvent::Profiles { revision, row, .. } => {
                if *revision <= self.profile_revision {
                    tracing::warn!(
                        user_id = %self.user_id,
                        revision,
                        confirmed = self.profile_revision,
                        "stale profile snapshot ignored"
                    );
                    return false;
                }
                self.profile_revision = *revision;
                self.confirmed = ProgressSnapshot::project(
                    row.point_total,
                    GrowthState {
                        level: self.confirmed.growth_level,
                        carry: self.confirmed.growth_carry,
                    },
                );
            }
            ChangeEvent::Trees { revision, row, .. } => {
                if *revision <= self.tree_revision {
                    tracing::warn!(
                        user_id = %self.user_id,
                        revision,
                        confirmed = self.tree_revision,
                        "stale tree snapshot ignored"
                    );
                    return false;
                }
                self.tree_revision = *revision;
                self.confirmed.growth_level = row.growth_level;
                self.confirmed.growth_carry = row.growth_carry;
            }
        }
        self.settle_prediction();
        true
    }

    fn settle_prediction(&mut self) {
        let settled = self.pending.is_some_and(|pending| {
            self.profile_revision > pending.profile_revision
                && self.tree_revision > pending.tree_revision
        });
        if settled {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::GrowthAccrual;
    use crate::store::{ProfileCounters, TreeRow};
    use crate::tree::TreeStage;

    fn base() -> ProgressSnapshot {
        ProgressSnapshot::from_rows(
            &ProfileCounters::default(),
            &TreeRow {
                growth_level: 1,
                ..TreeRow::default()
            },
        )
    }

    fn profile(revision: u64, point_total: u64) -> ChangeEvent {
        ChangeEvent::Profiles {
            user_id: "u1".to_string(),
            revision,
            row: ProfileCounters {
                point_total,
                ..ProfileCounters::default()
            },
        }
    }

    fn tree(revision: u64, growth_level: u32) -> ChangeEvent {
        ChangeEvent::Trees {
            user_id: "u1".to_string(),
            revision,
            row: TreeRow {
                growth_level,
                ..TreeRow::default()
            },
        }
    }

    #[test]
    fn prediction_shows_until_both_tables_confirm() {
        let mut view = ProgressView::new("u1", base(), StoreRevisions::default());
        view.apply_prediction(base().predict(GrowthAccrual::PerEvent, 10));
        assert_eq!(view.displayed().point_total, 10);
        assert_eq!(view.displayed().growth_level, 3);
        assert_eq!(view.confirmed().point_total, 0);

        assert!(view.apply_snapshot(&profile(1, 10)));
        assert!(view.pending().is_some());
        assert!(view.apply_snapshot(&tree(1, 3)));
        assert!(view.pending().is_none());
        assert_eq!(view.displayed().point_total, 10);
        assert_eq!(view.displayed().growth_level, 3);
        assert_eq!(view.displayed().stage, TreeStage::Red);
    }

    #[test]
    fn duplicate_and_out_of_order_snapshots_are_ignored() {
        let mut view = ProgressView::new("u1", base(), StoreRevisions::default());
        assert!(view.apply_snapshot(&profile(2, 61)));
        assert!(!view.apply_snapshot(&profile(2, 61)));
        assert!(!view.apply_snapshot(&profile(1, 11)));
        assert_eq!(view.confirmed().point_total, 61);
        assert_eq!(view.confirmed().inventory.tier2_count, 1);
        assert_eq!(view.confirmed().inventory.tier1_count, 1);
    }

    #[test]
    fn snapshots_for_other_users_are_ignored() {
        let mut view = ProgressView::new("u1", base(), StoreRevisions::default());
        let foreign = ChangeEvent::Profiles {
            user_id: "u2".to_string(),
            revision: 9,
            row: ProfileCounters {
                point_total: 500,
                ..ProfileCounters::default()
            },
        };
        assert!(!view.apply_snapshot(&foreign));
        assert_eq!(view.confirmed().point_total, 0);
    }

    #[test]
    fn view_seeded_from_a_fresh_read_ignores_older_snapshots() {
        let seeded = ProgressSnapshot::from_rows(
            &ProfileCounters {
                point_total: 20,
                ..ProfileCounters::default()
            },
            &TreeRow {
                growth_level: 5,
                ..TreeRow::default()
            },
        );
        let mut view = ProgressView::new(
            "u1",
            seeded,
            StoreRevisions {
                profile: 2,
                tree: 2,
            },
        );

        assert!(!view.apply_snapshot(&profile(1, 10)));
        assert!(!view.apply_snapshot(&tree(1, 3)));
        assert!(!view.apply_snapshot(&profile(2, 20)));
        assert_eq!(view.confirmed().point_total, 20);
        assert_eq!(view.confirmed().growth_level, 5);

        assert!(view.apply_snapshot(&profile(3, 30)));
        assert_eq!(view.confirmed().point_total, 30);
    }

    #[test]
    fn lagging_feed_does_not_settle_a_newer_prediction() {
        let mut view = ProgressView::new("u1", base(), StoreRevisions::default());
        let mut prediction = base().predict(GrowthAccrual::PerEvent, 10);
        prediction.based_on = StoreRevisions {
            profile: 2,
            tree: 2,
        };
        view.apply_prediction(prediction);

        assert!(view.apply_snapshot(&profile(2, 5)));
        assert!(view.apply_snapshot(&tree(2, 2)));
        assert!(view.pending().is_some());
        assert_eq!(view.displayed().point_total, 10);

        assert!(view.apply_snapshot(&profile(3, 15)));
        assert!(view.apply_snapshot(&tree(3, 4)));
        assert!(view.pending().is_none());
        assert_eq!(view.displayed().point_total, 15);
    }

    #[test]
    fn stale_prediction_never_overwrites_confirmed_state() {
        let mut view = ProgressView::new("u1", base(), StoreRevisions::default());
        view.apply_prediction(base().predict(GrowthAccrual::PerEvent, 1));
        assert!(view.apply_snapshot(&profile(3, 25)));
        assert!(view.apply_snapshot(&tree(3, 6)));
        assert!(view.pending().is_none());
        assert_eq!(view.confirmed().point_total, 25);
        assert_eq!(view.displayed().growth_level, 6);
    }
}
