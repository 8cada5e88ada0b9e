use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak_days: u64,
    pub longest_streak_days: u64,
    #[serde(default)]
    pub last_point_earned_date: Option<NaiveDate>,
}

impl StreakState {
    /// Record that points were earned on `today`.
    ///
    /// Earning again on the same day keeps the streak, the next calendar day
    /// extends it, and any gap restarts it at one.
    #[must_use]
    pub fn advance(self, today: NaiveDate) -> Self {
        let current = match self.last_point_earned_date {
            Some(last) if last == today => self.current_streak_days.max(1),
            Some(last) if last.succ_opt() == Some(today) => self.current_streak_days + 1,
            Some(last) if last > today => {
                tracing::warn!(%last, %today, "point date moved backwards; keeping streak");
                return self;
            }
            _ => 1,
        };
        Self {
            current_streak_days: current,
            longest_streak_days: self.longest_streak_days.max(current),
            last_point_earned_date: Some(today),
        }
    }

    /// Whether points have been earned on `today`.
    #[must_use]
    pub fn earned_on(&self, today: NaiveDate) -> bool {
        self.last_point_earned_date == Some(today)
    }
}

/// Whether the daily streak popup should open on page load.
#[must_use]
pub fn should_show_streak_popup(
    streak: &StreakState,
    popup_shown_date: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    streak.current_streak_days > 0 && streak.earned_on(today) && popup_shown_date != Some(today)
}

/// Whether a live profile update should open the streak popup: the streak must
/// have grown since the previously displayed value.
#[must_use]
pub fn should_show_streak_popup_on_update(
    previous_streak_days: u64,
    updated: &StreakState,
    popup_shown_date: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    updated.current_streak_days > previous_streak_days
        && should_show_streak_popup(updated, popup_shown_date, today)
}
