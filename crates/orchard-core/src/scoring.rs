use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OrchardError, Result};

/// One point per completed 25-minute focus block.
pub const FOCUS_BLOCK_SECONDS: u64 = 1500;
/// Every fourth completed focus session is followed by a long break.
pub const LONG_BREAK_INTERVAL: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    #[must_use]
    pub const fn points(&self) -> u64 {
        match self {
            Self::Low => 1,
            Self::Medium => 5,
            Self::High => 10,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for TaskPriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = OrchardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(OrchardError::InvalidInput(format!(
                "unknown task priority: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    #[serde(rename = "focus")]
    Focus,
    #[serde(rename = "break")]
    Break,
    #[serde(rename = "longbreak")]
    LongBreak,
}

impl SessionKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Break => "break",
            Self::LongBreak => "longbreak",
        }
    }

    #[must_use]
    pub const fn is_scored(&self) -> bool {
        matches!(self, Self::Focus)
    }

    /// Kind of the session that follows this one, given how many focus
    /// sessions have been completed including the one just finished.
    #[must_use]
    pub const fn next_after(&self, completed_focus_sessions: u64) -> Self {
        match self {
            Self::Focus => {
                if completed_focus_sessions > 0
                    && completed_focus_sessions % LONG_BREAK_INTERVAL == 0
                {
                    Self::LongBreak
                } else {
                    Self::Break
                }
            }
            Self::Break | Self::LongBreak => Self::Focus,
        }
    }
}

impl Display for SessionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = OrchardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focus" => Ok(Self::Focus),
            "break" | "short_break" | "shortbreak" => Ok(Self::Break),
            "longbreak" | "long_break" => Ok(Self::LongBreak),
            other => Err(OrchardError::InvalidInput(format!(
                "unknown session kind: {other}"
            ))),
        }
    }
}

/// Event points earned by a focus session; partial blocks earn nothing.
pub fn session_event_points(duration_seconds: i64) -> Result<u64> {
    let seconds = u64::try_from(duration_seconds)
        .map_err(|_| OrchardError::negative("duration_seconds", duration_seconds))?;
    Ok(seconds / FOCUS_BLOCK_SECONDS)
}

/// Event points for a completed session of any kind. Breaks never score.
pub fn scored_session_points(kind: SessionKind, duration_seconds: i64) -> Result<u64> {
    let points = session_event_points(duration_seconds)?;
    Ok(if kind.is_scored() { points } else { 0 })
}
