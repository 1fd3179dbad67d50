//! Layout algorithms.
//!
//! A [`Layout`] couples one [`LayoutKind`] with the [`Manager`] holding the
//! clients it arranges.  Placement is pure: [`Layout::arrange`] maps the
//! manager state, the desktop rectangle and the gap to one target geometry
//! per client without touching any window.  [`Layout::update_proportions`]
//! is the inverse: it reads a manual resize back into the manager's
//! proportions.
//!
//! | name                | kind                                       |
//! |---------------------|--------------------------------------------|
//! | `vertical-left`     | masters in a left column, slaves right     |
//! | `vertical-right`    | masters right, slaves left                 |
//! | `horizontal-top`    | masters in a top row, slaves below         |
//! | `horizontal-bottom` | masters at the bottom, slaves above        |
//! | `maximized`         | every client fills the desktop (with gap)  |
//! | `fullscreen`        | every client fills the desktop, no gap     |
//! | `grid`              | near-square grid                           |

mod grid;
mod tiled;

use crate::client::WindowId;
use crate::geometry::{Directions, Rect};
use crate::manager::{Manager, ManagerSettings};
use std::fmt;
use std::str::FromStr;

/// Target geometry for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub window: WindowId,
    pub geometry: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// Master column beside a slave column; `mirrored` puts the masters
    /// on the right.
    Vertical { mirrored: bool },
    /// Master row above a slave row; `mirrored` puts the masters at the
    /// bottom.
    Horizontal { mirrored: bool },
    Maximized,
    Fullscreen,
    Grid,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown layout: {0}")]
pub struct ParseLayoutError(String);

impl LayoutKind {
    /// Every kind, in cycling order.
    pub const ALL: [LayoutKind; 7] = [
        LayoutKind::Vertical { mirrored: false },
        LayoutKind::Vertical { mirrored: true },
        LayoutKind::Horizontal { mirrored: false },
        LayoutKind::Horizontal { mirrored: true },
        LayoutKind::Maximized,
        LayoutKind::Fullscreen,
        LayoutKind::Grid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LayoutKind::Vertical { mirrored: false } => "vertical-left",
            LayoutKind::Vertical { mirrored: true } => "vertical-right",
            LayoutKind::Horizontal { mirrored: false } => "horizontal-top",
            LayoutKind::Horizontal { mirrored: true } => "horizontal-bottom",
            LayoutKind::Maximized => "maximized",
            LayoutKind::Fullscreen => "fullscreen",
            LayoutKind::Grid => "grid",
        }
    }

    /// Position in [`LayoutKind::ALL`].
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).unwrap_or(0)
    }

    /// The kind `step` places further along the cycle, wrapping both ways.
    pub fn cycle(&self, step: isize) -> LayoutKind {
        let n = Self::ALL.len() as isize;
        let i = (self.index() as isize + step).rem_euclid(n);
        Self::ALL[i as usize]
    }

    /// Index of the master column in the master/slave proportion vector.
    pub fn master_column(&self) -> usize {
        match self {
            LayoutKind::Vertical { mirrored } | LayoutKind::Horizontal { mirrored } => {
                usize::from(*mirrored)
            }
            _ => 0,
        }
    }

    /// Whether clients are split into a master and a slave area.
    pub fn is_tiled(&self) -> bool {
        matches!(self, LayoutKind::Vertical { .. } | LayoutKind::Horizontal { .. })
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutKind {
    type Err = ParseLayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| ParseLayoutError(s.to_string()))
    }
}

/// A layout kind together with its client store.
#[derive(Debug, Clone)]
pub struct Layout {
    kind: LayoutKind,
    manager: Manager,
}

impl Layout {
    /// `settings.proportion` is the master share; mirrored kinds store it
    /// in the second column.
    pub fn new(kind: LayoutKind, mut settings: ManagerSettings) -> Self {
        if kind.master_column() == 1 {
            settings.proportion = 1.0 - settings.proportion;
        }
        Self {
            kind,
            manager: Manager::new(settings),
        }
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut Manager {
        &mut self.manager
    }

    /// Target geometries for every managed client inside `area`.
    ///
    /// Deterministic, and empty when the manager holds no clients.
    pub fn arrange(&self, area: Rect, gap: i32) -> Vec<Placement> {
        match self.kind {
            LayoutKind::Vertical { mirrored } => tiled::arrange(&self.manager, area, gap, mirrored),
            LayoutKind::Horizontal { mirrored } => {
                tiled::arrange(&self.manager, area.transpose(), gap, mirrored)
                    .into_iter()
                    .map(|p| Placement {
                        window: p.window,
                        geometry: p.geometry.transpose(),
                    })
                    .collect()
            }
            LayoutKind::Maximized => self.fill(area.inset(gap)),
            LayoutKind::Fullscreen => self.fill(area),
            LayoutKind::Grid => grid::arrange(&self.manager, area, gap),
        }
    }

    fn fill(&self, geometry: Rect) -> Vec<Placement> {
        self.manager
            .clients()
            .into_iter()
            .map(|window| Placement { window, geometry })
            .collect()
    }

    /// Read a manual resize of `window` back into the proportions.
    ///
    /// `geometry` is the window's new outer geometry, `dirs` the edges that
    /// moved.  Layouts without proportions ignore the call.  Returns whether
    /// anything changed.
    pub fn update_proportions(
        &mut self,
        window: WindowId,
        geometry: Rect,
        dirs: Directions,
        area: Rect,
        gap: i32,
    ) -> bool {
        match self.kind {
            LayoutKind::Vertical { mirrored } => {
                tiled::update_proportions(&mut self.manager, window, geometry, dirs, area, gap, mirrored)
            }
            LayoutKind::Horizontal { mirrored } => tiled::update_proportions(
                &mut self.manager,
                window,
                geometry.transpose(),
                dirs.transpose(),
                area.transpose(),
                gap,
                mirrored,
            ),
            LayoutKind::Maximized | LayoutKind::Fullscreen | LayoutKind::Grid => false,
        }
    }

    /// Grow (`delta > 0`) or shrink the master area.  No-op for layouts
    /// without one.
    pub fn resize_master(&mut self, delta: f64) -> bool {
        if !self.kind.is_tiled() {
            return false;
        }
        self.manager.resize_master(delta, self.kind.master_column())
    }
}
