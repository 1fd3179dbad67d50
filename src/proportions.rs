//! Proportion vectors.
//!
//! A [`Ratios`] vector holds relative sizes of sibling panes along one axis.
//! Its entries always sum to `1.0`: the only mutator, [`Ratios::set`],
//! changes two entries at once and keeps their pair sum constant.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A vector of ratios summing to `1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ratios {
    values: Vec<f64>,
}

impl Ratios {
    /// An even split into `n` parts.  `n = 0` is treated as `1`.
    pub fn even(n: usize) -> Self {
        let n = n.max(1);
        Self {
            values: vec![1.0 / n as f64; n],
        }
    }

    /// A two-entry split `[first, 1 - first]`, with `first` kept inside
    /// `[floor, 1 - floor]`.
    pub fn pair(first: f64, floor: f64) -> Self {
        let mut ratios = Self::even(2);
        ratios.set(first, 0, 1, floor);
        ratios
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Sum of all entries (`1.0` within floating point error).
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Sum of the first `n` entries.
    ///
    /// Layouts renormalise by this when fewer panes are visible than the
    /// vector has entries.
    pub fn sum_of(&self, n: usize) -> f64 {
        self.values.iter().take(n).sum()
    }

    /// Set `self[a] = value` and give the difference to `self[b]`.
    ///
    /// Both entries stay at or above `floor`; if the pair sum is too small
    /// for that, the pair is split evenly.  Returns `false` without touching
    /// anything when `a == b` or either index is out of range.
    pub fn set(&mut self, value: f64, a: usize, b: usize, floor: f64) -> bool {
        if a == b || a >= self.values.len() || b >= self.values.len() {
            return false;
        }
        if !value.is_finite() {
            return false;
        }
        let pair = self.values[a] + self.values[b];
        let lo = floor.max(0.0).min(pair / 2.0);
        let value = value.clamp(lo, pair - lo);
        self.values[a] = value;
        self.values[b] = pair - value;
        true
    }
}

impl Index<usize> for Ratios {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

/// The three proportion vectors of one layout manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proportions {
    /// Master area vs slave area along the main axis.  Entry `0` is the
    /// left (or top) column, entry `1` the right (or bottom) one.
    pub master_slave: Ratios,
    /// Relative sizes of the visible masters.
    pub master_master: Ratios,
    /// Relative sizes of the visible slaves.
    pub slave_slave: Ratios,
}

/// Selects one of the three vectors in [`Proportions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    MasterSlave,
    MasterMaster,
    SlaveSlave,
}

impl Proportions {
    pub fn get(&self, axis: Axis) -> &Ratios {
        match axis {
            Axis::MasterSlave => &self.master_slave,
            Axis::MasterMaster => &self.master_master,
            Axis::SlaveSlave => &self.slave_slave,
        }
    }

    pub fn get_mut(&mut self, axis: Axis) -> &mut Ratios {
        match axis {
            Axis::MasterSlave => &mut self.master_slave,
            Axis::MasterMaster => &mut self.master_master,
            Axis::SlaveSlave => &mut self.slave_slave,
        }
    }
}
