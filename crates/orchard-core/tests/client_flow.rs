use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use orchard_core::catalog::AchievementCatalog;
use orchard_core::growth::GrowthAccrual;
use orchard_core::scoring::{SessionKind, TaskPriority};
use orchard_core::store::{AccountStore, ChangeEvent};
use orchard_core::{
    AchievementProgress, EngineConfig, MemoryStore, Orchard, OrchardError, TreeStage,
};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 4, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn orchard_with_user(accrual: GrowthAccrual) -> (MemoryStore, Orchard) {
    let store = MemoryStore::new(accrual);
    store.create_user("u1", 1).expect("create user");
    let config = EngineConfig::default().with_growth_accrual(accrual);
    let orchard = Orchard::new(Arc::new(store.clone()), config);
    (store, orchard)
}

#[test]
fn session_then_high_priority_task_reaches_first_red_apple() {
    let (store, orchard) = orchard_with_user(GrowthAccrual::PerEvent);
    let start = orchard.progress("u1").expect("initial progress");
    assert_eq!(start.point_total, 0);
    assert_eq!(start.growth_level, 1);
    assert_eq!(start.stage, TreeStage::Sapling);

    let session = orchard
        .complete_focus_session("u1", at(9, 0), at(9, 25), SessionKind::Focus)
        .expect("complete session");
    let predicted = session.prediction.expect("focus sessions are predicted");
    assert_eq!(predicted.event_points, 1);
    assert_eq!(predicted.snapshot, session.confirmed);
    assert_eq!(session.confirmed.point_total, 1);
    assert_eq!(session.confirmed.growth_level, 1);

    store
        .add_task("u1", "write-report", TaskPriority::High)
        .expect("add task");
    let task = orchard
        .complete_task("u1", "write-report", TaskPriority::High, at(10, 0))
        .expect("complete task");
    assert_eq!(task.points_awarded, 10);
    assert_eq!(task.prediction.snapshot, task.confirmed);
    assert_eq!(task.confirmed.growth_level, 3);

    let end = orchard.progress("u1").expect("final progress");
    assert_eq!(end.point_total, 11);
    assert_eq!(
        (
            end.inventory.tier1_count,
            end.inventory.tier2_count,
            end.inventory.tier3_count,
            end.inventory.tier4_count
        ),
        (1, 0, 0, 0)
    );
    assert_eq!(end.stage, TreeStage::Red);
}

#[test]
fn break_sessions_are_not_recorded_and_empty_sessions_are_rejected() {
    let (store, orchard) = orchard_with_user(GrowthAccrual::PerEvent);

    let outcome = orchard
        .complete_focus_session("u1", at(9, 0), at(9, 5), SessionKind::Break)
        .expect("break session");
    assert!(outcome.prediction.is_none());
    assert!(store.completed_sessions("u1").expect("sessions").is_empty());

    let err = orchard
        .complete_focus_session("u1", at(9, 0), at(9, 0), SessionKind::Focus)
        .expect_err("zero-length session");
    assert!(matches!(err, OrchardError::InvalidInput(_)));
}

#[test]
fn change_feed_converges_despite_duplicates_and_reordering() {
    let (store, orchard) = orchard_with_user(GrowthAccrual::PerEvent);
    let feed: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&feed);
    store
        .subscribe(
            "u1",
            Arc::new(move |event: &ChangeEvent| {
                sink.lock().expect("feed").push(event.clone());
            }),
        )
        .expect("subscribe");

    let mut view = orchard.progress_view("u1").expect("view");
    for (index, minutes) in [25_i64, 50, 75].into_iter().enumerate() {
        let start = at(9, 0) + Duration::hours(index as i64);
        let outcome = orchard
            .complete_focus_session("u1", start, start + Duration::minutes(minutes), SessionKind::Focus)
            .expect("session");
        if let Some(prediction) = outcome.prediction {
            view.apply_prediction(prediction);
        }
    }
    assert_eq!(view.displayed().point_total, 6);

    let mut events = feed.lock().expect("feed").clone();
    assert_eq!(events.len(), 6);
    events.reverse();
    let duplicate = events[0].clone();
    events.push(duplicate);

    let accepted = events
        .iter()
        .filter(|event| view.apply_snapshot(event))
        .count();
    assert_eq!(accepted, 2);
    assert!(view.pending().is_none());
    assert_eq!(*view.displayed(), orchard.progress("u1").expect("progress"));
    assert_eq!(view.displayed().point_total, 6);
}

#[test]
fn view_from_fresh_read_rejects_delayed_snapshots() {
    let (store, orchard) = orchard_with_user(GrowthAccrual::PerEvent);
    let feed: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&feed);
    store
        .subscribe(
            "u1",
            Arc::new(move |event: &ChangeEvent| {
                sink.lock().expect("feed").push(event.clone());
            }),
        )
        .expect("subscribe");
    for task_id in ["a", "b"] {
        store.add_task("u1", task_id, TaskPriority::High).expect("add task");
        orchard
            .complete_task("u1", task_id, TaskPriority::High, at(10, 0))
            .expect("complete task");
    }

    let mut view = orchard.progress_view("u1").expect("view");
    assert_eq!(view.confirmed().point_total, 20);

    let delayed = feed.lock().expect("feed").clone();
    assert_eq!(delayed.len(), 4);
    assert_eq!(delayed[0].revision(), 1);
    assert!(delayed.iter().all(|event| !view.apply_snapshot(event)));
    assert_eq!(view.confirmed().point_total, 20);
    assert_eq!(view.confirmed().growth_level, 5);

    store.add_task("u1", "c", TaskPriority::Low).expect("add task");
    let outcome = orchard
        .complete_task("u1", "c", TaskPriority::Low, at(11, 0))
        .expect("complete task");
    assert_eq!(outcome.prediction.based_on.profile, 2);
    view.apply_prediction(outcome.prediction);
    assert!(!view.apply_snapshot(&delayed[0]));
    assert!(view.pending().is_some());

    let latest = feed.lock().expect("feed").clone();
    for event in &latest[4..] {
        assert!(view.apply_snapshot(event));
    }
    assert!(view.pending().is_none());
    assert_eq!(view.confirmed().point_total, 21);
}

#[test]
fn cumulative_accrual_keeps_remainders_across_events() {
    let (_store, orchard) = orchard_with_user(GrowthAccrual::Cumulative);
    for hour in 9..14 {
        orchard
            .complete_focus_session("u1", at(hour, 0), at(hour, 25), SessionKind::Focus)
            .expect("session");
    }
    let progress = orchard.progress("u1").expect("progress");
    assert_eq!(progress.point_total, 5);
    assert_eq!(progress.growth_level, 2);

    let (_store, per_event) = orchard_with_user(GrowthAccrual::PerEvent);
    for hour in 9..14 {
        per_event
            .complete_focus_session("u1", at(hour, 0), at(hour, 25), SessionKind::Focus)
            .expect("session");
    }
    assert_eq!(per_event.progress("u1").expect("progress").growth_level, 1);
}

#[test]
fn achievement_panel_reflects_store_counters_and_unlocks() {
    let (store, orchard) = orchard_with_user(GrowthAccrual::PerEvent);
    for index in 0..4 {
        let task_id = format!("t{index}");
        store
            .add_task("u1", &task_id, TaskPriority::Medium)
            .expect("add task");
        orchard
            .complete_task("u1", &task_id, TaskPriority::Medium, at(11, index))
            .expect("complete task");
    }
    store
        .unlock_achievement("u1", "first_session", at(8, 0))
        .expect("unlock");

    let panel = orchard.achievement_panel("u1", at(18, 0)).expect("panel");
    assert_eq!(panel.total_count, AchievementCatalog::default().achievements.len());
    assert_eq!(panel.unlocked_count, 1);
    assert_eq!(panel.recently_unlocked[0].id, "first_session");

    let quick_start = panel
        .achievements
        .iter()
        .find(|view| view.id == "tasks_5_day")
        .expect("tasks_5_day");
    assert_eq!(
        quick_start.progress,
        AchievementProgress::InProgress {
            current: 4,
            target: 5
        }
    );
    assert_eq!(quick_start.percent, Some(80));
}

#[test]
fn weekly_summary_and_streak_popup_follow_recorded_activity() {
    let (store, orchard) = orchard_with_user(GrowthAccrual::PerEvent);
    orchard
        .complete_focus_session("u1", at(9, 0), at(9, 50), SessionKind::Focus)
        .expect("session");

    let summary = orchard.weekly_summary("u1", at(20, 0)).expect("summary");
    assert_eq!(summary.totals.total_points_earned, 2);
    assert_eq!(summary.productivity_score, 2);
    assert_eq!(summary.days[3].points, 2);

    let today = NaiveDate::from_ymd_opt(2026, 3, 4).expect("date");
    assert!(orchard.streak_popup_due("u1", today).expect("popup"));
    store
        .mark_streak_popup_shown("u1", today)
        .expect("mark popup");
    assert!(!orchard.streak_popup_due("u1", today).expect("popup"));
}
