//! Bounded growth-level accumulator.
//!
//! Growth advances by one level per five event points and saturates at
//! [`MAX_GROWTH_LEVEL`]. It never decreases and cannot be derived from the
//! point total alone.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OrchardError, Result};

pub const MAX_GROWTH_LEVEL: u32 = 100;
pub const POINTS_PER_GROWTH_LEVEL: u64 = 5;

/// How event points are turned into growth levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthAccrual {
    /// Divide each event's points on their own; remainders are dropped.
    #[default]
    PerEvent,
    /// Carry remainders between events so growth tracks the cumulative total.
    Cumulative,
}

impl GrowthAccrual {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerEvent => "per_event",
            Self::Cumulative => "cumulative",
        }
    }
}

impl Display for GrowthAccrual {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrowthAccrual {
    type Err = OrchardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_event" => Ok(Self::PerEvent),
            "cumulative" => Ok(Self::Cumulative),
            other => Err(OrchardError::InvalidInput(format!(
                "unknown growth accrual mode: {other}"
            ))),
        }
    }
}

/// Growth level together with the event points not yet converted into a level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthState {
    pub level: u32,
    #[serde(default)]
    pub carry: u64,
}

impl GrowthState {
    pub fn new(level: i64) -> Result<Self> {
        Ok(Self {
            level: validate_level(level)?,
            carry: 0,
        })
    }

    #[must_use]
    pub const fn is_saturated(&self) -> bool {
        self.level >= MAX_GROWTH_LEVEL
    }

    /// Fold one scored event into the state.
    #[must_use]
    pub fn accrue(self, mode: GrowthAccrual, event_points: u64) -> Self {
        if self.is_saturated() {
            return Self {
                level: MAX_GROWTH_LEVEL,
                carry: 0,
            };
        }
        let (gained, carry) = match mode {
            GrowthAccrual::PerEvent => (event_points / POINTS_PER_GROWTH_LEVEL, 0),
            GrowthAccrual::Cumulative => {
                let pending = self.carry.saturating_add(event_points);
                (
                    pending / POINTS_PER_GROWTH_LEVEL,
                    pending % POINTS_PER_GROWTH_LEVEL,
                )
            }
        };
        let level = saturating_level(self.level, gained);
        Self {
            level,
            carry: if level >= MAX_GROWTH_LEVEL { 0 } else { carry },
        }
    }
}

/// Apply one scored event to a growth level.
///
/// `current_level` must already lie within `0..=100` and `event_points` must
/// be non-negative; anything else is rejected instead of clamped.
pub fn apply_event(current_level: i64, event_points: i64) -> Result<u32> {
    let level = validate_level(current_level)?;
    let points = u64::try_from(event_points)
        .map_err(|_| OrchardError::negative("event_points", event_points))?;
    Ok(saturating_level(level, points / POINTS_PER_GROWTH_LEVEL))
}

/// Replay a sequence of event points from a starting level.
pub fn replay_events(
    initial_level: i64,
    mode: GrowthAccrual,
    events: impl IntoIterator<Item = u64>,
) -> Result<GrowthState> {
    let state = GrowthState::new(initial_level)?;
    Ok(events
        .into_iter()
        .fold(state, |state, points| state.accrue(mode, points)))
}

fn validate_level(level: i64) -> Result<u32> {
    u32::try_from(level)
        .ok()
        .filter(|value| *value <= MAX_GROWTH_LEVEL)
        .ok_or_else(|| {
            OrchardError::InvalidInput(format!(
                "growth level must be within 0..={MAX_GROWTH_LEVEL}, got {level}"
            ))
        })
}

fn saturating_level(level: u32, gained: u64) -> u32 {
    let gained = u32::try_from(gained).unwrap_or(u32::MAX);
    level.saturating_add(gained).min(MAX_GROWTH_LEVEL)
}
