//! Achievement progress projection.
//!
//! Each achievement declares a condition key. Counted keys project a raw
//! counter onto a fixed target; instant keys unlock in one step and have no
//! progress to show.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{OrchardError, Result};
use crate::tree::TreeStage;

/// Longest-session progress is displayed in minutes up to two hours.
pub const LONGEST_SESSION_DISPLAY_CAP_MINUTES: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKey {
    Tasks10,
    Tasks100,
    Streak7,
    Streak30,
    Sessions100,
    TreeLevel3,
    TreeLevel4,
    Apples100,
    Hours100,
    Tasks5Day,
    Session120,
    GoldApple,
    DiamondApple,
    FirstSession,
    EarlyBird,
    NightOwl,
    DailyWeek,
    PerfectWeek,
}

/// Counter a counted condition reads its current value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressCounter {
    CompletedTasks,
    CurrentStreakDays,
    CompletedFocusSessions,
    TreeStage,
    TotalBaseUnits,
    FocusHours,
    TodayCompletedTasks,
    LongestSessionMinutes,
    CumulativePoints,
}

impl ConditionKey {
    pub const ALL: [Self; 18] = [
        Self::Tasks10,
        Self::Tasks100,
        Self::Streak7,
        Self::Streak30,
        Self::Sessions100,
        Self::TreeLevel3,
        Self::TreeLevel4,
        Self::Apples100,
        Self::Hours100,
        Self::Tasks5Day,
        Self::Session120,
        Self::GoldApple,
        Self::DiamondApple,
        Self::FirstSession,
        Self::EarlyBird,
        Self::NightOwl,
        Self::DailyWeek,
        Self::PerfectWeek,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks10 => "tasks_10",
            Self::Tasks100 => "tasks_100",
            Self::Streak7 => "streak_7",
            Self::Streak30 => "streak_30",
            Self::Sessions100 => "sessions_100",
            Self::TreeLevel3 => "tree_level_3",
            Self::TreeLevel4 => "tree_level_4",
            Self::Apples100 => "apples_100",
            Self::Hours100 => "hours_100",
            Self::Tasks5Day => "tasks_5_day",
            Self::Session120 => "session_120",
            Self::GoldApple => "gold_apple",
            Self::DiamondApple => "diamond_apple",
            Self::FirstSession => "first_session",
            Self::EarlyBird => "early_bird",
            Self::NightOwl => "night_owl",
            Self::DailyWeek => "daily_week",
            Self::PerfectWeek => "perfect_week",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|key| key.as_str() == raw)
    }

    /// Like [`ConditionKey::parse`] but reports unknown keys as an error.
    pub fn parse_strict(raw: &str) -> Result<Self> {
        Self::parse(raw).ok_or_else(|| OrchardError::UnknownCondition(raw.trim().to_string()))
    }

    /// Counter and target for counted conditions; `None` for instant unlocks.
    #[must_use]
    pub const fn rule(&self) -> Option<(ProgressCounter, u64)> {
        match self {
            Self::Tasks10 => Some((ProgressCounter::CompletedTasks, 10)),
            Self::Tasks100 => Some((ProgressCounter::CompletedTasks, 100)),
            Self::Streak7 => Some((ProgressCounter::CurrentStreakDays, 7)),
            Self::Streak30 => Some((ProgressCounter::CurrentStreakDays, 30)),
            Self::Sessions100 => Some((ProgressCounter::CompletedFocusSessions, 100)),
            Self::TreeLevel3 => Some((ProgressCounter::TreeStage, 3)),
            Self::TreeLevel4 => Some((ProgressCounter::TreeStage, 4)),
            Self::Apples100 => Some((ProgressCounter::TotalBaseUnits, 100)),
            Self::Hours100 => Some((ProgressCounter::FocusHours, 100)),
            Self::Tasks5Day => Some((ProgressCounter::TodayCompletedTasks, 5)),
            Self::Session120 => Some((
                ProgressCounter::LongestSessionMinutes,
                LONGEST_SESSION_DISPLAY_CAP_MINUTES,
            )),
            Self::GoldApple
            | Self::DiamondApple
            | Self::FirstSession
            | Self::EarlyBird
            | Self::NightOwl
            | Self::DailyWeek
            | Self::PerfectWeek => None,
        }
    }

    #[must_use]
    pub const fn is_instant(&self) -> bool {
        self.rule().is_none()
    }
}

impl Display for ConditionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw counters read from the store for one user at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterSnapshot {
    pub completed_task_count: u64,
    pub current_streak_days: u64,
    pub completed_focus_session_count: u64,
    pub tree_stage: TreeStage,
    pub total_base_units: u64,
    pub cumulative_focus_hours: f64,
    pub today_completed_task_count: u64,
    pub longest_session_minutes: u64,
    pub cumulative_points: u64,
}

impl CounterSnapshot {
    #[must_use]
    pub fn value(&self, counter: ProgressCounter) -> u64 {
        match counter {
            ProgressCounter::CompletedTasks => self.completed_task_count,
            ProgressCounter::CurrentStreakDays => self.current_streak_days,
            ProgressCounter::CompletedFocusSessions => self.completed_focus_session_count,
            ProgressCounter::TreeStage => u64::from(self.tree_stage.index()),
            ProgressCounter::TotalBaseUnits => self.total_base_units,
            ProgressCounter::FocusHours => whole_hours(self.cumulative_focus_hours),
            ProgressCounter::TodayCompletedTasks => self.today_completed_task_count,
            ProgressCounter::LongestSessionMinutes => self
                .longest_session_minutes
                .min(LONGEST_SESSION_DISPLAY_CAP_MINUTES),
            ProgressCounter::CumulativePoints => self.cumulative_points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AchievementProgress {
    InProgress { current: u64, target: u64 },
    Unlocked,
    NotApplicable,
}

impl AchievementProgress {
    /// Percentage of the target reached, rounded to the nearest integer.
    #[must_use]
    pub fn percent(&self) -> Option<u8> {
        match self {
            Self::InProgress { current, target } if *target > 0 => {
                let ratio = (*current as f64 / *target as f64) * 100.0;
                Some(ratio.round().clamp(0.0, 100.0) as u8)
            }
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_target_reached(&self) -> bool {
        matches!(self, Self::InProgress { current, target } if *current >= *target)
    }
}

/// Project counters for a condition key that carries no point threshold.
#[must_use]
pub fn progress_for(condition_key: &str, counters: &CounterSnapshot) -> AchievementProgress {
    progress_with_threshold(condition_key, None, counters)
}

/// Project counters for a condition key, falling back to the cumulative point
/// total when the key is unknown but the achievement declares a threshold.
#[must_use]
pub fn progress_with_threshold(
    condition_key: &str,
    points_required: Option<u64>,
    counters: &CounterSnapshot,
) -> AchievementProgress {
    let (counter, target) = match ConditionKey::parse(condition_key) {
        Some(key) => match key.rule() {
            Some(rule) => rule,
            None => return AchievementProgress::NotApplicable,
        },
        None => match points_required.filter(|threshold| *threshold > 0) {
            Some(threshold) => (ProgressCounter::CumulativePoints, threshold),
            None => {
                tracing::debug!(condition = condition_key, "no progress rule for condition");
                return AchievementProgress::NotApplicable;
            }
        },
    };
    AchievementProgress::InProgress {
        current: counters.value(counter).min(target),
        target,
    }
}

fn whole_hours(hours: f64) -> u64 {
    if hours.is_finite() && hours > 0.0 {
        hours.floor() as u64
    } else {
        0
    }
}
