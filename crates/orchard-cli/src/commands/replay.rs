use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use orchard_core::catalog::{AchievementCatalog, AchievementPanel};
use orchard_core::scoring::{SessionKind, TaskPriority};
use orchard_core::store::{AccountStore, ChangeEvent};
use orchard_core::{EngineConfig, MemoryStore, Orchard, ProgressSnapshot, ProgressView};
use serde::{Deserialize, Serialize};

use super::support::read_json_file;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ReplayEvent {
    CreateUser {
        user_id: String,
        #[serde(default = "default_growth_level")]
        growth_level: i64,
    },
    AddTask {
        user_id: String,
        task_id: String,
        priority: TaskPriority,
    },
    CompleteSession {
        user_id: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        #[serde(default = "default_session_kind")]
        kind: SessionKind,
    },
    CompleteTask {
        user_id: String,
        task_id: String,
        completed_at: DateTime<Utc>,
    },
}

const fn default_growth_level() -> i64 {
    1
}

const fn default_session_kind() -> SessionKind {
    SessionKind::Focus
}

#[derive(Debug, Serialize)]
pub(super) struct ReplayReport {
    pub(super) events_applied: usize,
    pub(super) feed_snapshots: usize,
    pub(super) users: Vec<UserReport>,
}

#[derive(Debug, Serialize)]
pub(super) struct UserReport {
    pub(super) user_id: String,
    pub(super) progress: ProgressSnapshot,
    pub(super) displayed: ProgressSnapshot,
    pub(super) current_streak_days: u64,
    pub(super) achievements: AchievementPanel,
}

pub(super) fn run_replay(
    path: &Path,
    catalog: AchievementCatalog,
    config: EngineConfig,
) -> Result<ReplayReport> {
    let events: Vec<ReplayEvent> = read_json_file(path)?;
    let store = MemoryStore::new(config.growth_accrual).with_catalog(catalog)?;
    let orchard = Orchard::new(Arc::new(store.clone()), config);

    let feed: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let mut users: Vec<String> = Vec::new();
    let mut views: HashMap<String, ProgressView> = HashMap::new();
    let mut priorities: HashMap<(String, String), TaskPriority> = HashMap::new();
    let mut last_seen: Option<DateTime<Utc>> = None;

    for (index, event) in events.iter().enumerate() {
        tracing::debug!(index, ?event, "replaying event");
        match event {
            ReplayEvent::CreateUser {
                user_id,
                growth_level,
            } => {
                store.create_user(user_id, *growth_level)?;
                let sink = Arc::clone(&feed);
                store.subscribe(
                    user_id,
                    Arc::new(move |change: &ChangeEvent| {
                        if let Ok(mut feed) = sink.lock() {
                            feed.push(change.clone());
                        }
                    }),
                )?;
                views.insert(user_id.clone(), orchard.progress_view(user_id)?);
                users.push(user_id.clone());
            }
            ReplayEvent::AddTask {
                user_id,
                task_id,
                priority,
            } => {
                store.add_task(user_id, task_id, *priority)?;
                priorities.insert((user_id.clone(), task_id.clone()), *priority);
            }
            ReplayEvent::CompleteSession {
                user_id,
                start_time,
                end_time,
                kind,
            } => {
                let outcome =
                    orchard.complete_focus_session(user_id, *start_time, *end_time, *kind)?;
                if let (Some(prediction), Some(view)) = (outcome.prediction, views.get_mut(user_id))
                {
                    view.apply_prediction(prediction);
                }
                last_seen = last_seen.max(Some(*end_time));
            }
            ReplayEvent::CompleteTask {
                user_id,
                task_id,
                completed_at,
            } => {
                let priority = priorities
                    .get(&(user_id.clone(), task_id.clone()))
                    .copied()
                    .ok_or_else(|| anyhow!("event {index}: task {task_id} was never added"))?;
                let outcome = orchard.complete_task(user_id, task_id, priority, *completed_at)?;
                if let Some(view) = views.get_mut(user_id) {
                    view.apply_prediction(outcome.prediction);
                }
                last_seen = last_seen.max(Some(*completed_at));
            }
        }
    }

    let snapshots = feed
        .lock()
        .map_err(|_| anyhow!("change feed mutex poisoned"))?
        .clone();
    for change in &snapshots {
        if let Some(view) = views.get_mut(change.user_id()) {
            view.apply_snapshot(change);
        }
    }

    let now = last_seen.unwrap_or_else(Utc::now);
    let mut reports = Vec::with_capacity(users.len());
    for user_id in users {
        let progress = orchard.progress(&user_id)?;
        let displayed = views
            .get(&user_id)
            .map_or(progress, |view| *view.displayed());
        reports.push(UserReport {
            current_streak_days: store.profile_counters(&user_id)?.current_streak_days,
            achievements: orchard.achievement_panel(&user_id, now)?,
            progress,
            displayed,
            user_id,
        });
    }
    tracing::info!(
        events = events.len(),
        users = reports.len(),
        "replay finished"
    );

    Ok(ReplayReport {
        events_applied: events.len(),
        feed_snapshots: snapshots.len(),
        users: reports,
    })
}
