//! Per-layout store of tracked clients.
//!
//! A [`Manager`] keeps the windows of one workspace split into masters and
//! slaves, how many of each are visible side by side, and the three
//! [`Proportions`] vectors the layouts read.  Every workspace owns one
//! manager per layout kind, so switching layouts never loses ordering or
//! proportions.

use crate::client::WindowId;
use crate::proportions::{Axis, Proportions, Ratios};
use log::debug;

/// Knobs a manager is created with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerSettings {
    /// Initial number of visible masters.
    pub masters_allowed: usize,
    /// Upper bound for [`Manager::increase_master`].
    pub masters_max: usize,
    /// Number of visible slaves.
    pub slaves_allowed: usize,
    /// Initial share of the first (left/top) column.
    pub proportion: f64,
    /// Smallest share any pane may be given.
    pub proportion_min: f64,
    /// Amount the master share changes per command.
    pub proportion_step: f64,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            masters_allowed: 1,
            masters_max: 4,
            slaves_allowed: 3,
            proportion: 0.5,
            proportion_min: 0.1,
            proportion_step: 0.05,
        }
    }
}

/// One role's clients and its visible-row cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub clients: Vec<WindowId>,
    pub allowed: usize,
}

impl Partition {
    fn new(allowed: usize) -> Self {
        Self {
            clients: Vec::new(),
            allowed: allowed.max(1),
        }
    }

    /// Number of clients visible at once: `min(len, allowed)`.
    pub fn visible(&self) -> usize {
        self.clients.len().min(self.allowed)
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.clients.contains(&window)
    }

    fn remove(&mut self, window: WindowId) -> bool {
        match Manager::index(&self.clients, window) {
            Some(i) => {
                self.clients.remove(i);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manager {
    pub masters: Partition,
    pub slaves: Partition,
    pub proportions: Proportions,
    settings: ManagerSettings,
}

impl Manager {
    pub fn new(settings: ManagerSettings) -> Self {
        let masters = Partition::new(settings.masters_allowed);
        let slaves = Partition::new(settings.slaves_allowed);
        let proportions = Proportions {
            master_slave: Ratios::pair(settings.proportion, settings.proportion_min),
            master_master: Ratios::even(masters.allowed),
            slave_slave: Ratios::even(slaves.allowed),
        };
        Self {
            masters,
            slaves,
            proportions,
            settings,
        }
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// All clients, masters first, each partition in discovery order.
    pub fn clients(&self) -> Vec<WindowId> {
        self.masters
            .clients
            .iter()
            .chain(self.slaves.clients.iter())
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.masters.clients.len() + self.slaves.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.masters.contains(window) || self.slaves.contains(window)
    }

    pub fn is_master(&self, window: WindowId) -> bool {
        self.masters.contains(window)
    }

    /// Position of `window` in `list`, `None` if absent.
    pub fn index(list: &[WindowId], window: WindowId) -> Option<usize> {
        list.iter().position(|&w| w == window)
    }

    /// Track `window`.  It becomes a master while masters have room and a
    /// slave otherwise.  Returns `false` if it was already tracked.
    pub fn add_client(&mut self, window: WindowId) -> bool {
        if self.contains(window) {
            return false;
        }
        if self.masters.clients.len() < self.masters.allowed {
            self.masters.clients.push(window);
        } else {
            self.slaves.clients.push(window);
        }
        true
    }

    /// Stop tracking `window`.
    ///
    /// A departing master is replaced by the head slave.  Proportions reset
    /// once the last client is gone.
    pub fn remove_client(&mut self, window: WindowId) -> bool {
        let removed = if self.masters.remove(window) {
            if self.masters.clients.len() < self.masters.allowed && !self.slaves.clients.is_empty() {
                let head = self.slaves.clients.remove(0);
                self.masters.clients.push(head);
            }
            true
        } else {
            self.slaves.remove(window)
        };
        if removed && self.is_empty() {
            debug!("last client removed, resetting proportions");
            self.reset_proportions();
        }
        removed
    }

    /// Promote `window` to the front of the masters.
    ///
    /// When that overflows the master cap the last master is demoted to the
    /// head of the slaves, i.e. the two swap roles.
    pub fn make_master(&mut self, window: WindowId) -> bool {
        if let Some(i) = Self::index(&self.masters.clients, window) {
            let w = self.masters.clients.remove(i);
            self.masters.clients.insert(0, w);
            return true;
        }
        if !self.slaves.remove(window) {
            return false;
        }
        self.masters.clients.insert(0, window);
        if self.masters.clients.len() > self.masters.allowed {
            if let Some(demoted) = self.masters.clients.pop() {
                self.slaves.clients.insert(0, demoted);
            }
        }
        true
    }

    /// One more visible master, promoting the head slave.
    pub fn increase_master(&mut self) -> bool {
        let cap = self.len().min(self.settings.masters_max).max(1);
        if self.masters.allowed >= cap {
            return false;
        }
        self.masters.allowed += 1;
        if self.masters.clients.len() < self.masters.allowed && !self.slaves.clients.is_empty() {
            let head = self.slaves.clients.remove(0);
            self.masters.clients.push(head);
        }
        self.proportions.master_master = Ratios::even(self.masters.allowed);
        true
    }

    /// One less visible master, demoting the last master.  Never below one.
    pub fn decrease_master(&mut self) -> bool {
        if self.masters.allowed <= 1 {
            return false;
        }
        self.masters.allowed -= 1;
        if self.masters.clients.len() > self.masters.allowed {
            if let Some(demoted) = self.masters.clients.pop() {
                self.slaves.clients.insert(0, demoted);
            }
        }
        self.proportions.master_master = Ratios::even(self.masters.allowed);
        true
    }

    /// Set `axis[a] = value`, compensating `axis[b]`.  See [`Ratios::set`].
    pub fn set_proportions(&mut self, axis: Axis, value: f64, a: usize, b: usize) -> bool {
        let floor = self.settings.proportion_min;
        self.proportions.get_mut(axis).set(value, a, b, floor)
    }

    /// Grow (positive `delta`) or shrink the master column, which sits at
    /// index `master_column` of the master/slave vector.
    pub fn resize_master(&mut self, delta: f64, master_column: usize) -> bool {
        let master_column = master_column.min(1);
        let current = self.proportions.master_slave[master_column];
        self.set_proportions(Axis::MasterSlave, current + delta, master_column, master_column ^ 1)
    }

    pub fn reset_proportions(&mut self) {
        self.proportions = Proportions {
            master_slave: Ratios::pair(self.settings.proportion, self.settings.proportion_min),
            master_master: Ratios::even(self.masters.allowed),
            slave_slave: Ratios::even(self.slaves.allowed),
        };
    }
}
