use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};

use crate::achievement::CounterSnapshot;
use crate::catalog::{AchievementCatalog, AchievementDefinition, UnlockRecord};
use crate::error::{OrchardError, Result};
use crate::growth::{GrowthAccrual, GrowthState};
use crate::reward::convert_points;
use crate::scoring::{SessionKind, TaskPriority, scored_session_points};
use crate::stats::{CompletedSession, CompletedTask};
use crate::streak::StreakState;
use crate::tree::stage_of;

use super::{
    AccountStore, ChangeEvent, ChangeListener, ProfileCounters, SessionCompletion,
    SubscriptionId, TreeRow,
};

/// In-process stand-in for the hosted store.
///
/// Every call runs under one lock, so concurrent completions for the same
/// user serialize their read-modify-write. Listeners are invoked after the
/// lock is released.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    accrual: GrowthAccrual,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, UserRecord>,
    definitions: Vec<AchievementDefinition>,
    listeners: Vec<Subscriber>,
    next_subscription: u64,
}

struct Subscriber {
    id: SubscriptionId,
    user_id: String,
    listener: ChangeListener,
}

#[derive(Debug, Default)]
struct UserRecord {
    profile: ProfileCounters,
    growth: GrowthState,
    revision: u64,
    tasks: HashMap<String, TaskRecord>,
    sessions: Vec<CompletedSession>,
    unlocks: Vec<UnlockRecord>,
}

#[derive(Debug, Clone)]
struct TaskRecord {
    priority: TaskPriority,
    completed_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("accrual", &self.accrual)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(GrowthAccrual::default())
    }
}

impl UserRecord {
    fn profile_row(&self) -> ProfileCounters {
        ProfileCounters {
            revision: self.revision,
            ..self.profile
        }
    }

    fn tree_row(&self) -> TreeRow {
        let inventory = convert_points(self.profile.point_total);
        TreeRow {
            revision: self.revision,
            growth_level: self.growth.level,
            growth_carry: self.growth.carry,
            total_base_units: inventory.total_base_units,
            tier1_count: inventory.tier1_count,
            tier2_count: inventory.tier2_count,
            tier3_count: inventory.tier3_count,
            tier4_count: inventory.tier4_count,
        }
    }

    fn streak(&self) -> StreakState {
        StreakState {
            current_streak_days: self.profile.current_streak_days,
            longest_streak_days: self.profile.longest_streak_days,
            last_point_earned_date: self.profile.last_point_earned_date,
        }
    }

    fn award(&mut self, accrual: GrowthAccrual, points: u64, day: NaiveDate) {
        self.profile.point_total = self.profile.point_total.saturating_add(points);
        self.growth = self.growth.accrue(accrual, points);
        if points > 0 {
            let streak = self.streak().advance(day);
            self.profile.current_streak_days = streak.current_streak_days;
            self.profile.longest_streak_days = streak.longest_streak_days;
            self.profile.last_point_earned_date = streak.last_point_earned_date;
        }
        self.revision += 1;
    }

    fn change_events(&self, user_id: &str) -> [ChangeEvent; 2] {
        [
            ChangeEvent::Profiles {
                user_id: user_id.to_string(),
                revision: self.revision,
                row: self.profile_row(),
            },
            ChangeEvent::Trees {
                user_id: user_id.to_string(),
                revision: self.revision,
                row: self.tree_row(),
            },
        ]
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new(accrual: GrowthAccrual) -> Self {
        let state = MemoryState {
            definitions: AchievementCatalog::default().achievements,
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            accrual,
        }
    }

    pub fn with_catalog(self, catalog: AchievementCatalog) -> Result<Self> {
        self.with_state(|state| {
            state.definitions = catalog.achievements;
            Ok(())
        })?;
        Ok(self)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> Result<T>) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| OrchardError::mutex_poisoned("memory store"))?;
        f(&mut state)
    }

    fn with_user<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut UserRecord) -> Result<T>,
    ) -> Result<T> {
        self.with_state(|state| {
            let user = state
                .users
                .get_mut(user_id)
                .ok_or_else(|| OrchardError::NotFound(format!("user {user_id}")))?;
            f(user)
        })
    }

    /// Run a mutation and publish the resulting rows to the user's listeners.
    fn mutate_and_publish<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut UserRecord) -> Result<T>,
    ) -> Result<T> {
        let (value, events, listeners) = self.with_state(|state| {
            let user = state
                .users
                .get_mut(user_id)
                .ok_or_else(|| OrchardError::NotFound(format!("user {user_id}")))?;
            let value = f(user)?;
            let events = user.change_events(user_id);
            let listeners: Vec<ChangeListener> = state
                .listeners
                .iter()
                .filter(|subscriber| subscriber.user_id == user_id)
                .map(|subscriber| Arc::clone(&subscriber.listener))
                .collect();
            Ok((value, events, listeners))
        })?;
        for event in &events {
            for listener in &listeners {
                listener(event);
            }
        }
        Ok(value)
    }

    pub fn create_user(&self, user_id: &str, growth_level: i64) -> Result<()> {
        let growth = GrowthState::new(growth_level)?;
        self.with_state(|state| {
            if state.users.contains_key(user_id) {
                return Err(OrchardError::Conflict(format!("user {user_id} already exists")));
            }
            state.users.insert(
                user_id.to_string(),
                UserRecord {
                    growth,
                    ..UserRecord::default()
                },
            );
            Ok(())
        })
    }

    pub fn add_task(&self, user_id: &str, task_id: &str, priority: TaskPriority) -> Result<()> {
        self.with_user(user_id, |user| {
            if user.tasks.contains_key(task_id) {
                return Err(OrchardError::Conflict(format!("task {task_id} already exists")));
            }
            user.tasks.insert(
                task_id.to_string(),
                TaskRecord {
                    priority,
                    completed_at: None,
                },
            );
            Ok(())
        })
    }

    pub fn unlock_achievement(
        &self,
        user_id: &str,
        achievement_id: &str,
        unlocked_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_user(user_id, |user| {
            if user
                .unlocks
                .iter()
                .any(|record| record.achievement_id == achievement_id)
            {
                return Ok(false);
            }
            user.unlocks.push(UnlockRecord {
                achievement_id: achievement_id.to_string(),
                unlocked_at,
            });
            Ok(true)
        })
    }

    pub fn mark_streak_popup_shown(&self, user_id: &str, day: NaiveDate) -> Result<()> {
        self.mutate_and_publish(user_id, |user| {
            user.profile.streak_popup_shown_date = Some(day);
            user.revision += 1;
            Ok(())
        })
    }
}

impl AccountStore for MemoryStore {
    fn profile_counters(&self, user_id: &str) -> Result<ProfileCounters> {
        self.with_user(user_id, |user| Ok(user.profile_row()))
    }

    fn tree_row(&self, user_id: &str) -> Result<TreeRow> {
        self.with_user(user_id, |user| Ok(user.tree_row()))
    }

    fn record_session_completion(&self, completion: &SessionCompletion) -> Result<()> {
        if completion.end_time < completion.start_time {
            return Err(OrchardError::InvalidInput(format!(
                "session for {} ends before it starts",
                completion.user_id
            )));
        }
        let duration = i64::try_from(completion.duration_seconds)
            .map_err(|_| OrchardError::InvalidInput("session duration overflows".to_string()))?;
        let points = scored_session_points(completion.kind, duration)?;
        let accrual = self.accrual;
        self.mutate_and_publish(&completion.user_id, |user| {
            user.sessions.push(CompletedSession {
                start_time: completion.start_time,
                duration_seconds: completion.duration_seconds,
                kind: completion.kind,
                points_earned: points,
            });
            user.award(accrual, points, completion.end_time.date_naive());
            Ok(())
        })?;
        tracing::info!(
            user_id = %completion.user_id,
            kind = %completion.kind,
            duration_seconds = completion.duration_seconds,
            points,
            "session recorded"
        );
        Ok(())
    }

    fn record_task_completion(
        &self,
        user_id: &str,
        task_id: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<u64> {
        let accrual = self.accrual;
        let points = self.mutate_and_publish(user_id, |user| {
            let task = user
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| OrchardError::NotFound(format!("task {task_id}")))?;
            if task.completed_at.is_some() {
                return Err(OrchardError::Conflict(format!(
                    "task {task_id} is already completed"
                )));
            }
            task.completed_at = Some(completed_at);
            let points = task.priority.points();
            user.award(accrual, points, completed_at.date_naive());
            Ok(points)
        })?;
        tracing::info!(user_id, task_id, points, "task completion recorded");
        Ok(points)
    }

    fn achievement_counters(&self, user_id: &str, today: NaiveDate) -> Result<CounterSnapshot> {
        self.with_user(user_id, |user| {
            let inventory = convert_points(user.profile.point_total);
            let focus_seconds: u64 = user
                .sessions
                .iter()
                .filter(|session| session.kind == SessionKind::Focus)
                .map(|session| session.duration_seconds)
                .sum();
            let longest_seconds = user
                .sessions
                .iter()
                .map(|session| session.duration_seconds)
                .max()
                .unwrap_or(0);
            let completed_at: Vec<DateTime<Utc>> = user
                .tasks
                .values()
                .filter_map(|task| task.completed_at)
                .collect();

            Ok(CounterSnapshot {
                completed_task_count: completed_at.len() as u64,
                current_streak_days: user.profile.current_streak_days,
                completed_focus_session_count: user
                    .sessions
                    .iter()
                    .filter(|session| session.kind == SessionKind::Focus)
                    .count() as u64,
                tree_stage: stage_of(&inventory),
                total_base_units: inventory.total_base_units,
                cumulative_focus_hours: focus_seconds as f64 / 3600.0,
                today_completed_task_count: completed_at
                    .iter()
                    .filter(|at| at.date_naive() == today)
                    .count() as u64,
                longest_session_minutes: longest_seconds / 60,
                cumulative_points: user.profile.point_total,
            })
        })
    }

    fn achievement_definitions(&self) -> Result<Vec<AchievementDefinition>> {
        self.with_state(|state| Ok(state.definitions.clone()))
    }

    fn unlocked_achievements(&self, user_id: &str) -> Result<Vec<UnlockRecord>> {
        self.with_user(user_id, |user| Ok(user.unlocks.clone()))
    }

    fn completed_sessions(&self, user_id: &str) -> Result<Vec<CompletedSession>> {
        self.with_user(user_id, |user| Ok(user.sessions.clone()))
    }

    fn completed_tasks(&self, user_id: &str) -> Result<Vec<CompletedTask>> {
        self.with_user(user_id, |user| {
            let mut tasks: Vec<CompletedTask> = user
                .tasks
                .values()
                .filter_map(|task| {
                    task.completed_at.map(|completed_at| CompletedTask {
                        completed_at,
                        points: task.priority.points(),
                    })
                })
                .collect();
            tasks.sort_by_key(|task| task.completed_at);
            Ok(tasks)
        })
    }

    fn subscribe(&self, user_id: &str, listener: ChangeListener) -> Result<SubscriptionId> {
        self.with_state(|state| {
            state.next_subscription += 1;
            let id = SubscriptionId(state.next_subscription);
            state.listeners.push(Subscriber {
                id,
                user_id: user_id.to_string(),
                listener,
            });
            Ok(id)
        })
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        self.with_state(|state| {
            let before = state.listeners.len();
            state.listeners.retain(|subscriber| subscriber.id != id);
            Ok(state.listeners.len() != before)
        })
    }
}
