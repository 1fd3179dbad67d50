//! Per-(desktop × screen) tiling state.
//!
//! A [`Workspace`] owns one [`Layout`] per [`LayoutKind`], all tracking the
//! same set of clients, and a small state machine:
//!
//! ```text
//!            first client             untile
//!   Empty ──────────────► Active ◄──────────► Disabled
//!     ▲                     │       tile
//!     └─────────────────────┘
//!        last client gone
//! ```
//!
//! Nothing here talks to the window manager.  Operations report what the
//! caller has to do through [`Outcome`].

use crate::client::{Location, WindowId};
use crate::command::Command;
use crate::geometry::{Directions, Rect};
use crate::layout::{Layout, LayoutKind, Placement};
use crate::manager::{Manager, ManagerSettings};
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilingState {
    /// No clients.
    Empty,
    /// Clients are arranged by the active layout.
    Active,
    /// Clients are tracked but left where the user puts them.
    Disabled,
}

/// What the owner of a workspace has to do after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Nothing,
    /// Run a placement pass.
    Retile,
    /// Put every client back to its pre-tiling geometry.
    Restore,
    /// Activate this window.
    Focus(WindowId),
}

#[derive(Debug, Clone)]
pub struct Workspace {
    location: Location,
    state: TilingState,
    /// State entered by the first client.
    enabled: bool,
    layouts: Vec<Layout>,
    active: usize,
}

impl Workspace {
    pub fn new(location: Location, kind: LayoutKind, settings: ManagerSettings, enabled: bool) -> Self {
        let layouts = LayoutKind::ALL
            .iter()
            .map(|&k| Layout::new(k, settings))
            .collect();
        Self {
            location,
            state: TilingState::Empty,
            enabled,
            layouts,
            active: kind.index(),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn state(&self) -> TilingState {
        self.state
    }

    pub fn is_tiling(&self) -> bool {
        self.state == TilingState::Active
    }

    pub fn layout(&self) -> &Layout {
        &self.layouts[self.active]
    }

    pub fn manager(&self) -> &Manager {
        self.layout().manager()
    }

    fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layouts[self.active]
    }

    /// Clients in the active layout's order.
    pub fn clients(&self) -> Vec<WindowId> {
        self.manager().clients()
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.manager().contains(window)
    }

    /// Track `window` in every layout.
    pub fn add_client(&mut self, window: WindowId) -> bool {
        let mut added = false;
        for layout in &mut self.layouts {
            added |= layout.manager_mut().add_client(window);
        }
        if added && self.state == TilingState::Empty {
            self.state = if self.enabled {
                TilingState::Active
            } else {
                TilingState::Disabled
            };
            debug!("workspace {:?} is now {:?}", self.location, self.state);
        }
        added
    }

    /// Stop tracking `window` in every layout.
    pub fn remove_client(&mut self, window: WindowId) -> bool {
        let mut removed = false;
        for layout in &mut self.layouts {
            removed |= layout.manager_mut().remove_client(window);
        }
        if removed && self.manager().is_empty() && self.state == TilingState::Active {
            self.state = TilingState::Empty;
            debug!("workspace {:?} is now empty", self.location);
        }
        removed
    }

    /// Turn tiling on.  An empty workspace only remembers the choice.
    pub fn enable(&mut self) -> Outcome {
        self.enabled = true;
        match self.state {
            TilingState::Disabled if self.manager().is_empty() => {
                self.state = TilingState::Empty;
                Outcome::Nothing
            }
            TilingState::Disabled => {
                info!("tiling enabled on {:?}", self.location);
                self.state = TilingState::Active;
                Outcome::Retile
            }
            TilingState::Active => Outcome::Retile,
            TilingState::Empty => Outcome::Nothing,
        }
    }

    /// Turn tiling off.  Clients stay tracked.
    pub fn disable(&mut self) -> Outcome {
        self.enabled = false;
        match self.state {
            TilingState::Active => {
                info!("tiling disabled on {:?}", self.location);
                self.state = TilingState::Disabled;
                Outcome::Restore
            }
            _ => Outcome::Nothing,
        }
    }

    pub fn toggle(&mut self) -> Outcome {
        if self.state == TilingState::Active {
            self.disable()
        } else {
            self.enable()
        }
    }

    /// Switch `step` places along the layout cycle.
    pub fn cycle(&mut self, step: isize) -> LayoutKind {
        let next = self.layout().kind().cycle(step);
        self.active = next.index();
        info!("layout on {:?} is now {}", self.location, next);
        next
    }

    /// Client `step` places after `current` in layout order, wrapping.
    /// Without a current client the first one is chosen.
    pub fn neighbour(&self, current: Option<WindowId>, step: isize) -> Option<WindowId> {
        let clients = self.clients();
        if clients.is_empty() {
            return None;
        }
        let Some(i) = current.and_then(|w| Manager::index(&clients, w)) else {
            return clients.first().copied();
        };
        let n = clients.len() as isize;
        let j = (i as isize + step).rem_euclid(n);
        clients.get(j as usize).copied()
    }

    /// Placements of the active layout, empty unless tiling.
    pub fn arrange(&self, area: Rect, gap: i32) -> Vec<Placement> {
        if !self.is_tiling() {
            return Vec::new();
        }
        self.layout().arrange(area, gap)
    }

    /// Feed a manual resize into the active layout.
    pub fn update_proportions(
        &mut self,
        window: WindowId,
        old: Rect,
        new: Rect,
        area: Rect,
        gap: i32,
    ) -> bool {
        if !self.is_tiling() {
            return false;
        }
        let dirs = Directions::between(&old, &new);
        self.layout_mut().update_proportions(window, new, dirs, area, gap)
    }

    /// Run a user command.  `active` is the focused window, if any.
    pub fn execute(&mut self, command: Command, active: Option<WindowId>) -> Outcome {
        let active = active.filter(|&w| self.contains(w));
        let step = self.manager().settings().proportion_step;
        let changed = match command {
            Command::Tile => return self.enable(),
            Command::Untile => return self.disable(),
            Command::Toggle => return self.toggle(),
            Command::NextWindow => return self.focus(active, 1),
            Command::PreviousWindow => return self.focus(active, -1),
            Command::CycleNext => {
                self.cycle(1);
                true
            }
            Command::CyclePrevious => {
                self.cycle(-1);
                true
            }
            Command::MakeMaster => match active {
                Some(w) => self.layout_mut().manager_mut().make_master(w),
                None => false,
            },
            Command::IncreaseMaster => self.layout_mut().manager_mut().increase_master(),
            Command::DecreaseMaster => self.layout_mut().manager_mut().decrease_master(),
            Command::IncreaseProportion => self.layout_mut().resize_master(step),
            Command::DecreaseProportion => self.layout_mut().resize_master(-step),
        };
        if changed && self.is_tiling() {
            Outcome::Retile
        } else {
            Outcome::Nothing
        }
    }

    fn focus(&self, active: Option<WindowId>, step: isize) -> Outcome {
        match self.neighbour(active, step) {
            Some(w) if Some(w) != active => Outcome::Focus(w),
            _ => Outcome::Nothing,
        }
    }
}
