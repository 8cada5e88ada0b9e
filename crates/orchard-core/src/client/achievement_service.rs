use chrono::{DateTime, NaiveDate, Utc};

use crate::catalog::AchievementPanel;
use crate::error::Result;
use crate::stats::WeeklySummary;
use crate::streak::{StreakState, should_show_streak_popup};

use super::Orchard;

impl Orchard {
    pub fn achievement_panel(&self, user_id: &str, now: DateTime<Utc>) -> Result<AchievementPanel> {
        let counters = self
            .store
            .achievement_counters(user_id, now.date_naive())?;
        let definitions = self.store.achievement_definitions()?;
        let unlocks = self.store.unlocked_achievements(user_id)?;
        let panel = AchievementPanel::build(&definitions, &unlocks, &counters);
        tracing::debug!(
            user_id,
            unlocked = panel.unlocked_count,
            total = panel.total_count,
            "achievement panel built"
        );
        Ok(panel)
    }

    pub fn weekly_summary(&self, user_id: &str, now: DateTime<Utc>) -> Result<WeeklySummary> {
        let sessions = self.store.completed_sessions(user_id)?;
        let tasks = self.store.completed_tasks(user_id)?;
        Ok(WeeklySummary::build(
            now,
            self.config.weekly_goal,
            &sessions,
            &tasks,
        ))
    }

    pub fn streak_popup_due(&self, user_id: &str, today: NaiveDate) -> Result<bool> {
        let profile = self.store.profile_counters(user_id)?;
        let streak = StreakState {
            current_streak_days: profile.current_streak_days,
            longest_streak_days: profile.longest_streak_days,
            last_point_earned_date: profile.last_point_earned_date,
        };
        Ok(should_show_streak_popup(
            &streak,
            profile.streak_popup_shown_date,
            today,
        ))
    }
}
