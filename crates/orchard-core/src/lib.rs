// Public fallible APIs in this crate share one concrete error contract (`OrchardError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod achievement;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod growth;
pub mod reconcile;
pub mod reward;
pub mod scoring;
pub mod stats;
pub mod store;
pub mod streak;
pub mod tree;

pub use achievement::{AchievementProgress, ConditionKey, CounterSnapshot, progress_for};
pub use catalog::{AchievementCatalog, AchievementDefinition, AchievementPanel, UnlockRecord};
pub use client::{Orchard, Prediction, ProgressSnapshot};
pub use config::EngineConfig;
pub use error::{ErrorPayload, OrchardError, Result};
pub use growth::{GrowthAccrual, apply_event};
pub use reconcile::ProgressView;
pub use reward::{AppleTier, RewardInventory, convert};
pub use store::{AccountStore, ChangeEvent, MemoryStore};
pub use tree::{TreeStage, stage_of};
