//! Engine settings sourced from the process environment.

use std::path::PathBuf;

use crate::error::{OrchardError, Result};
use crate::growth::GrowthAccrual;
use crate::stats::DEFAULT_WEEKLY_GOAL;

mod env;

pub const ENV_GROWTH_ACCRUAL: &str = "ORCHARD_GROWTH_ACCRUAL";
pub const ENV_WEEKLY_GOAL: &str = "ORCHARD_WEEKLY_GOAL";
pub const ENV_CATALOG_PATH: &str = "ORCHARD_CATALOG";

const MIN_WEEKLY_GOAL: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub growth_accrual: GrowthAccrual,
    pub weekly_goal: u64,
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            growth_accrual: GrowthAccrual::default(),
            weekly_goal: DEFAULT_WEEKLY_GOAL,
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            growth_accrual: parse_growth_accrual(
                env::read_non_empty_env(ENV_GROWTH_ACCRUAL).as_deref(),
            )?,
            weekly_goal: env::read_env_u64_at_least(
                ENV_WEEKLY_GOAL,
                DEFAULT_WEEKLY_GOAL,
                MIN_WEEKLY_GOAL,
            ),
            catalog_path: env::read_non_empty_env(ENV_CATALOG_PATH).map(PathBuf::from),
        })
    }

    #[must_use]
    pub const fn with_growth_accrual(mut self, growth_accrual: GrowthAccrual) -> Self {
        self.growth_accrual = growth_accrual;
        self
    }

    #[must_use]
    pub fn with_weekly_goal(mut self, weekly_goal: u64) -> Self {
        self.weekly_goal = weekly_goal.max(MIN_WEEKLY_GOAL);
        self
    }
}

fn parse_growth_accrual(raw: Option<&str>) -> Result<GrowthAccrual> {
    match raw {
        None => Ok(GrowthAccrual::default()),
        Some(value) => value.parse().map_err(|_| {
            OrchardError::Validation(format!(
                "{ENV_GROWTH_ACCRUAL} must be per_event or cumulative, got {value}"
            ))
        }),
    }
}
