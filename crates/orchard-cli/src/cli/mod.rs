use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;
mod parsers;


pub use args::{
    GrowArgs, PanelArgs, PointsArg, ProgressArgs, ReplayArgs, SessionPointsArgs, StageArgs,
    TaskPointsArgs, WeekArgs,
};

#[derive(Debug, Parser)]
#[command(name = "orchard")]
#[command(about = "Orchard reward conversion and progression engine", version)]
pub struct Cli {
    /// Achievement catalog (TOML). Falls back to `ORCHARD_CATALOG`, then the built-in catalog.
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert a point total into its apple inventory and tree stage.
    Convert(PointsArg),
    /// Tree stage for explicit tier counts.
    Stage(StageArgs),
    /// Apply scored events to a growth level.
    Grow(GrowArgs),
    SessionPoints(SessionPointsArgs),
    TaskPoints(TaskPointsArgs),
    /// Progress of one achievement condition against a counter snapshot.
    Progress(ProgressArgs),
    Panel(PanelArgs),
    Week(WeekArgs),
    /// Replay recorded activity against an in-memory store.
    Replay(ReplayArgs),
}

impl Commands {
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Convert(_) => "convert",
            Self::Stage(_) => "stage",
            Self::Grow(_) => "grow",
            Self::SessionPoints(_) => "session_points",
            Self::TaskPoints(_) => "task_points",
            Self::Progress(_) => "progress",
            Self::Panel(_) => "panel",
            Self::Week(_) => "week",
            Self::Replay(_) => "replay",
        }
    }
}
