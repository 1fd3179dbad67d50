//! Commands and events used throughout ewtile.
//!
//! This module defines the vocabulary that all components share:
//! [`Command`] describes every action a user can request, [`Event`] every
//! input the [`Tracker`](crate::tracker::Tracker) reacts to.
//!
//! On the wire a command is a JSON string.  Parsing is forgiving about case
//! and separators, so `"CycleNext"`, `"cycle-next"` and `"cycle_next"` all
//! name the same command.

use crate::client::WindowId;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Every action the user can ask for.
///
/// Each one acts on the workspace of the active window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Command {
    /// Enable tiling.
    Tile,
    /// Disable tiling and restore the pre-tiling geometries.
    Untile,
    /// Flip between [`Tile`](Command::Tile) and [`Untile`](Command::Untile).
    Toggle,
    /// Switch to the next layout.
    CycleNext,
    /// Switch to the previous layout.
    CyclePrevious,
    /// Promote the active window to the front of the masters.
    MakeMaster,
    /// Show one more master side by side.
    IncreaseMaster,
    /// Show one master less.
    DecreaseMaster,
    /// Grow the master area by one step.
    IncreaseProportion,
    /// Shrink the master area by one step.
    DecreaseProportion,
    /// Focus the next window in layout order.
    NextWindow,
    /// Focus the previous window in layout order.
    PreviousWindow,
}

impl Command {
    pub const ALL: [Command; 12] = [
        Command::Tile,
        Command::Untile,
        Command::Toggle,
        Command::CycleNext,
        Command::CyclePrevious,
        Command::MakeMaster,
        Command::IncreaseMaster,
        Command::DecreaseMaster,
        Command::IncreaseProportion,
        Command::DecreaseProportion,
        Command::NextWindow,
        Command::PreviousWindow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::Tile => "tile",
            Command::Untile => "untile",
            Command::Toggle => "toggle",
            Command::CycleNext => "cycle-next",
            Command::CyclePrevious => "cycle-previous",
            Command::MakeMaster => "make-master",
            Command::IncreaseMaster => "increase-master",
            Command::DecreaseMaster => "decrease-master",
            Command::IncreaseProportion => "increase-proportion",
            Command::DecreaseProportion => "decrease-proportion",
            Command::NextWindow => "next-window",
            Command::PreviousWindow => "previous-window",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a command name (case-insensitive; `-`, `_` and spaces ignored).
pub fn parse_command(s: &str) -> Option<Command> {
    let normalize = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(|c| c.to_lowercase())
            .collect()
    };
    let wanted = normalize(s);
    Command::ALL
        .iter()
        .find(|c| normalize(c.name()) == wanted)
        .copied()
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_command(&s).ok_or_else(|| DeError::custom(format!("invalid command: {:?}", s)))
    }
}

/// Everything the tracker reacts to.
///
/// Produced by [`EventSource`](crate::traits::EventSource) implementations
/// and consumed by the [`Tracker`](crate::tracker::Tracker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The set of managed windows changed.
    ClientListChanged,
    /// A window was moved or resized.
    WindowConfigured(WindowId),
    /// A window's EWMH state or type changed.
    WindowStateChanged(WindowId),
    /// Focus moved to another window.
    ActiveWindowChanged,
    /// Another desktop became current.
    DesktopChanged,
    /// Screens were added, removed or resized, or desktops were added or
    /// removed.
    TopologyChanged,
    /// A user command.
    Command(Command),
}
