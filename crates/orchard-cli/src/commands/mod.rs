use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use orchard_core::achievement::{ConditionKey, progress_with_threshold};
use orchard_core::catalog::{AchievementCatalog, AchievementPanel, UnlockRecord};
use orchard_core::growth::replay_events;
use orchard_core::reward::{RewardInventory, convert};
use orchard_core::scoring::session_event_points;
use orchard_core::stats::{WeeklySummary, daily_goals};
use orchard_core::tree::stage_of;
use orchard_core::{EngineConfig, OrchardError};
use serde::Deserialize;

use crate::cli::{Cli, Commands};

mod replay;
mod support;

use self::replay::run_replay;
use self::support::{print_json, read_json_file};

#[derive(Debug, Deserialize)]
struct WeeklyActivity {
    #[serde(default)]
    sessions: Vec<orchard_core::stats::CompletedSession>,
    #[serde(default)]
    tasks: Vec<orchard_core::stats::CompletedTask>,
}

pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::from_env()?;
    let catalog_path = cli.catalog.or_else(|| config.catalog_path.clone());

    match cli.command {
        Commands::Convert(args) => {
            let inventory = convert(args.points)?;
            print_json(&serde_json::json!({
                "point_total": args.points,
                "inventory": inventory,
                "stage": stage_of(&inventory),
            }))?;
        }
        Commands::Stage(args) => {
            let inventory =
                RewardInventory::from_counts(args.tier1, args.tier2, args.tier3, args.tier4)?;
            let stage = stage_of(&inventory);
            print_json(&serde_json::json!({
                "inventory": inventory,
                "stage": stage,
                "stage_name": stage.name(),
            }))?;
        }
        Commands::Grow(args) => {
            let mode = args.mode.unwrap_or(config.growth_accrual);
            let points = args
                .event_points
                .iter()
                .map(|value| {
                    u64::try_from(*value).map_err(|_| {
                        OrchardError::InvalidInput(format!(
                            "event_points must be non-negative, got {value}"
                        ))
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let state = replay_events(args.level, mode, points)?;
            print_json(&serde_json::json!({
                "mode": mode,
                "growth_level": state.level,
                "growth_carry": state.carry,
                "saturated": state.is_saturated(),
            }))?;
        }
        Commands::SessionPoints(args) => {
            print_json(&serde_json::json!({
                "duration_seconds": args.seconds,
                "event_points": session_event_points(args.seconds)?,
            }))?;
        }
        Commands::TaskPoints(args) => {
            print_json(&serde_json::json!({
                "priority": args.priority,
                "event_points": args.priority.points(),
            }))?;
        }
        Commands::Progress(args) => {
            if args.strict {
                ConditionKey::parse_strict(&args.condition)?;
            }
            let counters = read_json_file(&args.counters)?;
            let progress =
                progress_with_threshold(&args.condition, args.points_required, &counters);
            print_json(&serde_json::json!({
                "condition": args.condition,
                "progress": progress,
                "percent": progress.percent(),
            }))?;
        }
        Commands::Panel(args) => {
            let catalog = load_catalog(catalog_path)?;
            let counters = read_json_file(&args.counters)?;
            let unlocks: Vec<UnlockRecord> = match &args.unlocks {
                Some(path) => read_json_file(path)?,
                None => Vec::new(),
            };
            let panel = AchievementPanel::build(&catalog.achievements, &unlocks, &counters);
            print_json(&panel)?;
        }
        Commands::Week(args) => {
            let goal = args.goal.unwrap_or(config.weekly_goal);
            match &args.activity {
                Some(path) => {
                    let activity: WeeklyActivity = read_json_file(path)?;
                    let now = args.now.unwrap_or_else(Utc::now);
                    let summary =
                        WeeklySummary::build(now, goal, &activity.sessions, &activity.tasks);
                    print_json(&summary)?;
                }
                None => {
                    print_json(&serde_json::json!({
                        "points_goal": goal,
                        "daily_goals": daily_goals(goal),
                    }))?;
                }
            }
        }
        Commands::Replay(args) => {
            let catalog = load_catalog(catalog_path)?;
            let report = run_replay(&args.events, catalog, config)?;
            print_json(&report)?;
        }
    }
    Ok(())
}

fn load_catalog(path: Option<PathBuf>) -> Result<AchievementCatalog> {
    match path {
        Some(path) => AchievementCatalog::load(&path)
            .with_context(|| format!("failed to load catalog {}", path.display())),
        None => Ok(AchievementCatalog::default()),
    }
}
