//! Rectangles and moved-edge sets.
//!
//! All coordinates are absolute pixels on the root window, `x`/`y` from the
//! top left.  Widths and heights are signed so intermediate layout math can
//! go negative without wrapping; the layouts never emit negative sizes for
//! sane inputs.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `other` lies completely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Whether the two rectangles share any area.  Touching edges do not
    /// count as overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Intersection of two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Shrink by `inset` pixels on every edge.
    pub fn inset(&self, inset: i32) -> Rect {
        Rect::new(
            self.x + inset,
            self.y + inset,
            self.w - 2 * inset,
            self.h - 2 * inset,
        )
    }

    /// Mirror across the main diagonal (swap the x and y axes).
    ///
    /// Horizontal layouts compute their placement in a transposed frame and
    /// transpose the results back, so they share every line of math with
    /// the vertical ones.
    pub fn transpose(&self) -> Rect {
        Rect::new(self.y, self.x, self.h, self.w)
    }

    pub fn same_size(&self, other: &Rect) -> bool {
        self.w == other.w && self.h == other.h
    }
}

/// Which edges of a window moved between two observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Directions {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Directions {
    /// Derive the moved edges from an old and a new geometry.
    pub fn between(old: &Rect, new: &Rect) -> Self {
        Self {
            left: old.x != new.x,
            right: old.right() != new.right(),
            top: old.y != new.y,
            bottom: old.bottom() != new.bottom(),
        }
    }

    /// Edge set as seen in the transposed frame (see [`Rect::transpose`]).
    pub fn transpose(&self) -> Self {
        Self {
            left: self.top,
            right: self.bottom,
            top: self.left,
            bottom: self.right,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.left || self.right || self.top || self.bottom)
    }
}
