use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievement::{AchievementProgress, CounterSnapshot, progress_with_threshold};
use crate::error::{OrchardError, Result};

const PANEL_SECTION_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub points_required: Option<u64>,
}

impl AchievementDefinition {
    /// Progress of this achievement for a user, given whether it is unlocked.
    #[must_use]
    pub fn progress(&self, counters: &CounterSnapshot, unlocked: bool) -> AchievementProgress {
        if unlocked {
            return AchievementProgress::Unlocked;
        }
        progress_with_threshold(
            self.condition.as_deref().unwrap_or_default(),
            self.points_required,
            counters,
        )
    }

    #[must_use]
    pub fn icon(&self) -> AchievementIcon {
        AchievementIcon::for_name(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementIcon {
    Target,
    Flame,
    Clock,
    Tree,
    Star,
    Trophy,
}

impl AchievementIcon {
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("task") {
            Self::Target
        } else if name.contains("streak") || name.contains("warrior") {
            Self::Flame
        } else if name.contains("time") || name.contains("focus") {
            Self::Clock
        } else if name.contains("tree") {
            Self::Tree
        } else if name.contains("first") {
            Self::Star
        } else {
            Self::Trophy
        }
    }
}

/// Unlock record for one (user, achievement) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRecord {
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementCatalog {
    #[serde(rename = "achievement", default)]
    pub achievements: Vec<AchievementDefinition>,
}

impl AchievementCatalog {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let catalog: Self = toml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for definition in &self.achievements {
            if definition.id.trim().is_empty() {
                return Err(OrchardError::Validation(format!(
                    "achievement '{}' has an empty id",
                    definition.name
                )));
            }
            if !seen.insert(definition.id.as_str()) {
                return Err(OrchardError::Validation(format!(
                    "duplicate achievement id: {}",
                    definition.id
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AchievementDefinition> {
        self.achievements.iter().find(|definition| definition.id == id)
    }
}

impl Default for AchievementCatalog {
    fn default() -> Self {
        let entries: [(&str, &str, &str, &str); 18] = [
            ("first_session", "First Steps", "Complete your first focus session", "first_session"),
            ("tasks_10", "Task Starter", "Complete 10 tasks", "tasks_10"),
            ("tasks_100", "Task Crusher", "Complete 100 tasks", "tasks_100"),
            ("tasks_5_day", "Quick Start", "Complete 5 tasks in one day", "tasks_5_day"),
            ("streak_7", "Streak Master", "Maintain a 7-day productivity streak", "streak_7"),
            ("streak_30", "Streak Warrior", "Maintain a 30-day productivity streak", "streak_30"),
            ("sessions_100", "Focus Centurion", "Complete 100 focus sessions", "sessions_100"),
            ("hours_100", "Time Master", "Accumulate 100 hours of focus time", "hours_100"),
            ("session_120", "Marathon Mind", "Focus for 120 minutes in a single session", "session_120"),
            ("tree_level_3", "Tree Whisperer", "Grow your tree to the gold stage", "tree_level_3"),
            ("tree_level_4", "Tree Legend", "Grow your tree to the diamond stage", "tree_level_4"),
            ("apples_100", "Orchard Keeper", "Collect 100 apples", "apples_100"),
            ("gold_apple", "Golden Apple", "Earn your first gold apple", "gold_apple"),
            ("diamond_apple", "Diamond Apple", "Earn your first diamond apple", "diamond_apple"),
            ("early_bird", "Early Bird", "Complete a focus session before 7am", "early_bird"),
            ("night_owl", "Night Owl", "Complete a focus session after 10pm", "night_owl"),
            ("daily_week", "Daily Devotion", "Earn points every day for a week", "daily_week"),
            ("perfect_week", "Perfect Week", "Hit every daily goal in a week", "perfect_week"),
        ];
        Self {
            achievements: entries
                .into_iter()
                .map(|(id, name, description, condition)| AchievementDefinition {
                    id: id.to_string(),
                    name: name.to_string(),
                    description: description.to_string(),
                    condition: Some(condition.to_string()),
                    points_required: None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: AchievementIcon,
    pub progress: AchievementProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl AchievementView {
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        matches!(self.progress, AchievementProgress::Unlocked)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementPanel {
    pub recently_unlocked: Vec<AchievementView>,
    pub in_progress: Vec<AchievementView>,
    pub unlocked_count: usize,
    pub total_count: usize,
    pub achievements: Vec<AchievementView>,
}

impl AchievementPanel {
    /// Project every definition for one user and pick the panel sections.
    #[must_use]
    pub fn build(
        definitions: &[AchievementDefinition],
        unlocks: &[UnlockRecord],
        counters: &CounterSnapshot,
    ) -> Self {
        let unlocked_at: HashMap<&str, DateTime<Utc>> = unlocks
            .iter()
            .map(|record| (record.achievement_id.as_str(), record.unlocked_at))
            .collect();

        let mut sorted: Vec<&AchievementDefinition> = definitions.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let achievements: Vec<AchievementView> = sorted
            .into_iter()
            .map(|definition| {
                let unlock = unlocked_at.get(definition.id.as_str()).copied();
                let progress = definition.progress(counters, unlock.is_some());
                AchievementView {
                    id: definition.id.clone(),
                    name: definition.name.clone(),
                    description: definition.description.clone(),
                    icon: definition.icon(),
                    percent: progress.percent(),
                    progress,
                    unlocked_at: unlock,
                }
            })
            .collect();

        let mut recently_unlocked: Vec<AchievementView> = achievements
            .iter()
            .filter(|view| view.is_unlocked())
            .cloned()
            .collect();
        recently_unlocked.sort_by(|a, b| b.unlocked_at.cmp(&a.unlocked_at));
        recently_unlocked.truncate(PANEL_SECTION_LIMIT);

        let in_progress = achievements
            .iter()
            .filter(|view| matches!(view.progress, AchievementProgress::InProgress { .. }))
            .take(PANEL_SECTION_LIMIT)
            .cloned()
            .collect();

        Self {
            recently_unlocked,
            in_progress,
            unlocked_count: achievements.iter().filter(|view| view.is_unlocked()).count(),
            total_count: achievements.len(),
            achievements,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::tree::TreeStage;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn unlock(id: &str, day: u32) -> UnlockRecord {
        UnlockRecord {
            achievement_id: id.to_string(),
            unlocked_at: at(day),
        }
    }

    #[test]
    fn default_catalog_covers_every_condition_key() {
        let catalog = AchievementCatalog::default();
        for key in crate::achievement::ConditionKey::ALL {
            assert!(
                catalog
                    .achievements
                    .iter()
                    .any(|definition| definition.condition.as_deref() == Some(key.as_str())),
                "missing {key}"
            );
        }
    }

    #[test]
    fn toml_catalog_loads_and_rejects_duplicates() {
        let raw = r#"
            [[achievement]]
            id = "a"
            name = "Task Starter"
            condition = "tasks_10"

            [[achievement]]
            id = "b"
            name = "Point Hoarder"
            points_required = 500
        "#;
        let catalog = AchievementCatalog::from_toml_str(raw).expect("parse");
        assert_eq!(catalog.achievements.len(), 2);
        assert_eq!(catalog.get("b").and_then(|d| d.points_required), Some(500));

        let duplicate = "[[achievement]]\nid = \"a\"\nname = \"x\"\n\n[[achievement]]\nid = \"a\"\nname = \"y\"\n";
        let err = AchievementCatalog::from_toml_str(duplicate).expect_err("duplicate");
        assert!(matches!(err, OrchardError::Validation(_)));
    }

    #[test]
    fn catalog_loads_from_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("catalog.toml");
        fs::write(&path, "[[achievement]]\nid = \"x\"\nname = \"Night Owl\"\ncondition = \"night_owl\"\n")
            .expect("write");
        let catalog = AchievementCatalog::load(&path).expect("load");
        assert_eq!(catalog.achievements[0].icon(), AchievementIcon::Trophy);
    }

    #[test]
    fn icons_follow_name_keywords() {
        assert_eq!(AchievementIcon::for_name("Task Crusher"), AchievementIcon::Target);
        assert_eq!(AchievementIcon::for_name("Streak Warrior"), AchievementIcon::Flame);
        assert_eq!(AchievementIcon::for_name("Time Master"), AchievementIcon::Clock);
        assert_eq!(AchievementIcon::for_name("Tree Legend"), AchievementIcon::Tree);
        assert_eq!(AchievementIcon::for_name("First Steps"), AchievementIcon::Star);
        assert_eq!(AchievementIcon::for_name("Golden Apple"), AchievementIcon::Trophy);
    }

    #[test]
    fn panel_sections_pick_recent_unlocks_and_open_progress() {
        let catalog = AchievementCatalog::default();
        let counters = CounterSnapshot {
            completed_task_count: 4,
            tree_stage: TreeStage::Red,
            ..CounterSnapshot::default()
        };
        let unlocks = vec![
            unlock("first_session", 1),
            unlock("gold_apple", 9),
            unlock("streak_7", 4),
            unlock("tasks_5_day", 6),
        ];

        let panel = AchievementPanel::build(&catalog.achievements, &unlocks, &counters);

        assert_eq!(panel.total_count, 18);
        assert_eq!(panel.unlocked_count, 4);
        let recent: Vec<&str> = panel
            .recently_unlocked
            .iter()
            .map(|view| view.id.as_str())
            .collect();
        assert_eq!(recent, vec!["gold_apple", "tasks_5_day", "streak_7"]);

        assert_eq!(panel.in_progress.len(), 3);
        assert!(panel.in_progress.iter().all(|view| !view.is_unlocked()));

        let starter = panel
            .achievements
            .iter()
            .find(|view| view.id == "tasks_10")
            .expect("tasks_10 view");
        assert_eq!(
            starter.progress,
            AchievementProgress::InProgress {
                current: 4,
                target: 10
            }
        );
        assert_eq!(starter.percent, Some(40));

        let owl = panel
            .achievements
            .iter()
            .find(|view| view.id == "night_owl")
            .expect("night_owl view");
        assert_eq!(owl.progress, AchievementProgress::NotApplicable);
    }
}
