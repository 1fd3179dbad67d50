//! Near-square grid.
//!
//! `n` clients are spread over `ceil(sqrt(n))` columns.  Leftover clients go
//! to the rightmost columns, so every column holds either `k` or `k + 1`
//! rows.

use super::Placement;
use crate::geometry::Rect;
use crate::manager::Manager;

/// Split `length` pixels starting at `start` into `parts` spans separated
/// and surrounded by `gap`.  The last span absorbs rounding drift.
fn spans(start: i32, length: i32, parts: usize, gap: i32) -> Vec<(i32, i32)> {
    if parts == 0 {
        return Vec::new();
    }
    let avail = length - (parts as i32 + 1) * gap;
    let size = (f64::from(avail) / parts as f64).round() as i32;
    let end = start + length - gap;
    let mut pos = start + gap;
    (0..parts)
        .map(|i| {
            let extent = if i + 1 == parts { end - pos } else { size };
            let span = (pos, extent);
            pos += extent + gap;
            span
        })
        .collect()
}

pub(super) fn arrange(manager: &Manager, area: Rect, gap: i32) -> Vec<Placement> {
    let clients = manager.clients();
    let n = clients.len();
    if n == 0 {
        return Vec::new();
    }
    let cols = (n as f64).sqrt().ceil() as usize;

    let mut out = Vec::with_capacity(n);
    let mut remaining = clients.into_iter();
    let mut left = n;
    for (col, (x, w)) in spans(area.x, area.w, cols, gap).into_iter().enumerate() {
        let rows = left / (cols - col);
        left -= rows;
        for (y, h) in spans(area.y, area.h, rows, gap) {
            if let Some(window) = remaining.next() {
                out.push(Placement {
                    window,
                    geometry: Rect::new(x, y, w, h),
                });
            }
        }
    }
    out
}
