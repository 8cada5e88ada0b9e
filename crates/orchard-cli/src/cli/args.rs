use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use orchard_core::growth::GrowthAccrual;
use orchard_core::scoring::TaskPriority;

use super::parsers::{parse_min_one_u64, parse_utc_timestamp};

#[derive(Debug, Args)]
pub struct PointsArg {
    #[arg(allow_negative_numbers = true)]
    pub points: i64,
}

#[derive(Debug, Args)]
pub struct StageArgs {
    #[arg(long, default_value_t = 0)]
    pub tier1: u64,
    #[arg(long, default_value_t = 0)]
    pub tier2: u64,
    #[arg(long, default_value_t = 0)]
    pub tier3: u64,
    #[arg(long, default_value_t = 0)]
    pub tier4: u64,
}

#[derive(Debug, Args)]
pub struct GrowArgs {
    #[arg(allow_negative_numbers = true)]
    pub level: i64,
    /// Event points, applied in order.
    #[arg(required = true, allow_negative_numbers = true)]
    pub event_points: Vec<i64>,
    /// Defaults to `ORCHARD_GROWTH_ACCRUAL`.
    #[arg(long)]
    pub mode: Option<GrowthAccrual>,
}

#[derive(Debug, Args)]
pub struct SessionPointsArgs {
    #[arg(allow_negative_numbers = true)]
    pub seconds: i64,
}

#[derive(Debug, Args)]
pub struct TaskPointsArgs {
    pub priority: TaskPriority,
}

#[derive(Debug, Args)]
pub struct ProgressArgs {
    pub condition: String,
    /// JSON counter snapshot; missing fields default to zero.
    #[arg(long)]
    pub counters: PathBuf,
    #[arg(long)]
    pub points_required: Option<u64>,
    /// Reject condition keys outside the known set.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct PanelArgs {
    #[arg(long)]
    pub counters: PathBuf,
    /// JSON array of `{achievement_id, unlocked_at}` records.
    #[arg(long)]
    pub unlocks: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct WeekArgs {
    /// Weekly points goal. Defaults to `ORCHARD_WEEKLY_GOAL`.
    #[arg(long, value_parser = parse_min_one_u64)]
    pub goal: Option<u64>,
    /// JSON `{sessions, tasks}` activity to summarize.
    #[arg(long)]
    pub activity: Option<PathBuf>,
    /// Instant inside the week to summarize (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_utc_timestamp, requires = "activity")]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON array of activity events.
    pub events: PathBuf,
}
