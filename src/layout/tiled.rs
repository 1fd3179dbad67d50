//! Master/slave column tiling and its inverse.
//!
//! Everything here works in the *vertical* frame: masters and slaves are
//! columns side by side, clients of one partition are stacked top to bottom.
//! Horizontal layouts transpose their input and output around these
//! functions.
//!
//! ```text
//!  g      master       g    slave      g
//! +--+--------------+--+-----------+--+
//! |  |              |  |           |  |
//! |  |              |  +-----------+  |
//! |  |              |  |           |  |
//! +--+--------------+--+-----------+--+
//! ```
//!
//! The master column is inset by the gap on both sides, the slave column on
//! its outer side only, so the tiles plus three gaps always reconstruct the
//! full width.

use super::Placement;
use crate::client::WindowId;
use crate::geometry::{Directions, Rect};
use crate::manager::Manager;
use crate::proportions::{Axis, Ratios};

/// Horizontal extents `(x, w)` of the master and slave tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    master: (i32, i32),
    slave: (i32, i32),
}

fn columns(ratios: &Ratios, area: Rect, gap: i32, mirrored: bool, both: bool) -> Columns {
    let full = (area.x + gap, area.w - 2 * gap);
    if !both {
        return Columns {
            master: full,
            slave: full,
        };
    }
    let first = (area.w as f64 * ratios[0]).round() as i32;
    let second = area.w - first;
    let split = area.x + first;
    if mirrored {
        Columns {
            slave: (area.x + gap, first - gap),
            master: (split + gap, second - 2 * gap),
        }
    } else {
        Columns {
            master: (area.x + gap, first - 2 * gap),
            slave: (split, second - gap),
        }
    }
}

/// Vertical extents `(y, h)` for `count` clients stacked in groups of
/// `size`.
///
/// Client `i` takes row `i % size`; every `size`-th client starts over at
/// the top.  Row heights come from the first `size` entries of `ratios`,
/// renormalised by their sum.  The last row of a complete group absorbs the
/// rounding drift so it ends exactly one gap above the bottom.
fn rows(ratios: &Ratios, count: usize, size: usize, area: Rect, gap: i32) -> Vec<(i32, i32)> {
    if count == 0 || size == 0 {
        return Vec::new();
    }
    let avail = (area.h - (size as i32 + 1) * gap) as f64;
    let total = match ratios.sum_of(size) {
        t if t > 0.0 => t,
        _ => 1.0,
    };
    let top = area.y + gap;
    let bottom = area.bottom() - gap;

    let mut out = Vec::with_capacity(count);
    let mut y = top;
    for i in 0..count {
        let row = i % size;
        if row == 0 {
            y = top;
        }
        let complete = (i / size + 1) * size <= count;
        let h = if row == size - 1 && complete {
            bottom - y
        } else {
            let share = ratios.as_slice().get(row).copied().unwrap_or(0.0);
            (avail * share / total).round() as i32
        };
        out.push((y, h));
        y += h + gap;
    }
    out
}

/// Placement pass in the vertical frame.
pub(super) fn arrange(manager: &Manager, area: Rect, gap: i32, mirrored: bool) -> Vec<Placement> {
    let msize = manager.masters.visible();
    let ssize = manager.slaves.visible();
    let props = &manager.proportions;
    let cols = columns(&props.master_slave, area, gap, mirrored, msize > 0 && ssize > 0);

    let place = |clients: &[WindowId], ratios: &Ratios, size: usize, (x, w): (i32, i32)| {
        rows(ratios, clients.len(), size, area, gap)
            .into_iter()
            .zip(clients.iter())
            .map(|((y, h), &window)| Placement {
                window,
                geometry: Rect::new(x, y, w, h),
            })
            .collect::<Vec<_>>()
    };

    let mut out = place(&manager.masters.clients, &props.master_master, msize, cols.master);
    out.extend(place(&manager.slaves.clients, &props.slave_slave, ssize, cols.slave));
    out
}

/// Infer new proportions from a manual resize, in the vertical frame.
///
/// `geometry` is the window's new outer geometry and `dirs` the edges that
/// moved.  Returns whether any proportion changed.
pub(super) fn update_proportions(
    manager: &mut Manager,
    window: WindowId,
    geometry: Rect,
    dirs: Directions,
    area: Rect,
    gap: i32,
    mirrored: bool,
) -> bool {
    let msize = manager.masters.visible();
    let ssize = manager.slaves.visible();
    let master = manager.is_master(window);

    let (index, size, axis) = if master {
        (Manager::index(&manager.masters.clients, window), msize, Axis::MasterMaster)
    } else {
        (Manager::index(&manager.slaves.clients, window), ssize, Axis::SlaveSlave)
    };
    let Some(index) = index else {
        return false;
    };

    let mut changed = false;

    // Edge shared with the other partition.
    if msize > 0 && ssize > 0 && area.w > 0 {
        let master_column = usize::from(mirrored);
        let column = if master { master_column } else { master_column ^ 1 };
        let boundary = if column == 0 { dirs.right } else { dirs.left };
        if boundary {
            let insets = if master { 2 * gap } else { gap };
            let share = f64::from(geometry.w + insets) / f64::from(area.w);
            changed |= manager.set_proportions(Axis::MasterSlave, share, column, column ^ 1);
        }
    }

    // Edge shared with the neighbour above or below.
    let avail = area.h - (size as i32 + 1) * gap;
    if size > 1 && avail > 0 {
        let row = index % size;
        let neighbour = if dirs.top {
            row.checked_sub(1)
        } else if dirs.bottom {
            Some(row + 1).filter(|&n| n < size)
        } else {
            None
        };
        if let Some(neighbour) = neighbour {
            let total = manager.proportions.get(axis).sum_of(size);
            let share = f64::from(geometry.h) / f64::from(avail) * total;
            changed |= manager.set_proportions(axis, share, row, neighbour);
        }
    }

    changed
}
