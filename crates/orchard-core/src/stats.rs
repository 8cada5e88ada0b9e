//! Weekly statistics. Weeks run Sunday through Saturday in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::SessionKind;

pub const DEFAULT_WEEKLY_GOAL: u64 = 100;
const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub start_time: DateTime<Utc>,
    pub duration_seconds: u64,
    pub kind: SessionKind,
    #[serde(default)]
    pub points_earned: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub completed_at: DateTime<Utc>,
    pub points: u64,
}

/// Sunday that opens the week containing `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Half-open `[start, end)` instant range of the week containing `at`.
#[must_use]
pub fn week_bounds(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = week_start(at.date_naive())
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(at);
    (start, start + Duration::days(7))
}

/// Spread a weekly points goal over the days of the week, Sunday first.
/// Saturday absorbs the remainder.
#[must_use]
pub fn daily_goals(weekly_goal: u64) -> [u64; 7] {
    let base = weekly_goal / 7;
    let mut goals = [base; 7];
    goals[6] += weekly_goal % 7;
    goals
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTotals {
    pub total_focus_seconds: u64,
    pub total_sessions: u64,
    pub average_session_seconds: u64,
    pub total_tasks_completed: u64,
    pub total_points_earned: u64,
}

impl WeeklyTotals {
    /// Aggregate the sessions and tasks completed within `[start, end)`.
    ///
    /// Focus time only counts focus sessions, while the session count and
    /// the average span every completed session.
    #[must_use]
    pub fn aggregate(
        (start, end): (DateTime<Utc>, DateTime<Utc>),
        sessions: &[CompletedSession],
        tasks: &[CompletedTask],
    ) -> Self {
        let sessions: Vec<&CompletedSession> = sessions
            .iter()
            .filter(|session| session.start_time >= start && session.start_time < end)
            .collect();
        let tasks: Vec<&CompletedTask> = tasks
            .iter()
            .filter(|task| task.completed_at >= start && task.completed_at < end)
            .collect();

        let total_focus_seconds = sessions
            .iter()
            .filter(|session| session.kind == SessionKind::Focus)
            .map(|session| session.duration_seconds)
            .sum();
        let total_sessions = sessions.len() as u64;
        let all_seconds: u64 = sessions.iter().map(|session| session.duration_seconds).sum();
        let average_session_seconds = if total_sessions == 0 {
            0
        } else {
            (all_seconds as f64 / total_sessions as f64).round() as u64
        };
        let total_points_earned = sessions
            .iter()
            .map(|session| session.points_earned)
            .chain(tasks.iter().map(|task| task.points))
            .sum();

        Self {
            total_focus_seconds,
            total_sessions,
            average_session_seconds,
            total_tasks_completed: tasks.len() as u64,
            total_points_earned,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub day: String,
    pub hours: f64,
    pub tasks: u64,
    pub points: u64,
    pub daily_goal: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week_start_date: NaiveDate,
    pub points_goal: u64,
    pub totals: WeeklyTotals,
    pub focus_hours: f64,
    pub average_session_minutes: f64,
    pub productivity_score: u64,
    pub days: Vec<DailyProgress>,
}

impl WeeklySummary {
    /// Build the dashboard view of the week containing `now`.
    #[must_use]
    pub fn build(
        now: DateTime<Utc>,
        points_goal: u64,
        sessions: &[CompletedSession],
        tasks: &[CompletedTask],
    ) -> Self {
        let bounds = week_bounds(now);
        let totals = WeeklyTotals::aggregate(bounds, sessions, tasks);
        let productivity_score = if points_goal == 0 {
            0
        } else {
            (totals.total_points_earned as f64 / points_goal as f64 * 100.0).round() as u64
        };

        Self {
            week_start_date: bounds.0.date_naive(),
            points_goal,
            totals,
            focus_hours: round_to(totals.total_focus_seconds as f64 / 3600.0, 100.0),
            average_session_minutes: round_to(totals.average_session_seconds as f64 / 60.0, 100.0),
            productivity_score,
            days: daily_breakdown(bounds, points_goal, sessions, tasks),
        }
    }
}

fn daily_breakdown(
    (start, end): (DateTime<Utc>, DateTime<Utc>),
    points_goal: u64,
    sessions: &[CompletedSession],
    tasks: &[CompletedTask],
) -> Vec<DailyProgress> {
    let goals = daily_goals(points_goal);
    let mut seconds = [0_u64; 7];
    let mut task_counts = [0_u64; 7];
    let mut points = [0_u64; 7];

    for session in sessions.iter().filter(|session| {
        session.kind == SessionKind::Focus && session.start_time >= start && session.start_time < end
    }) {
        let day = session.start_time.weekday().num_days_from_sunday() as usize;
        seconds[day] += session.duration_seconds;
        points[day] += session.points_earned;
    }
    for task in tasks
        .iter()
        .filter(|task| task.completed_at >= start && task.completed_at < end)
    {
        let day = task.completed_at.weekday().num_days_from_sunday() as usize;
        task_counts[day] += 1;
        points[day] += task.points;
    }

    DAY_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| DailyProgress {
            day: (*name).to_string(),
            hours: round_to(seconds[index] as f64 / 3600.0, 10.0),
            tasks: task_counts[index],
            points: points[index],
            daily_goal: goals[index],
        })
        .collect()
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}
