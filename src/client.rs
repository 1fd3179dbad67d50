//! Tracked windows.
//!
//! A [`Client`] wraps one window id together with three snapshots of what
//! the adapter reported about it:
//!
//! * `original`: captured at first observation, never changed;
//! * `cached`: the pre-tiling state, seeded from the cache store, used to
//!   put the window back when tiling is disabled;
//! * `latest`: refreshed on every query, drives layout decisions.
//!
//! The module also holds the rules deciding which windows are tiled at all.

use crate::geometry::Rect;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Opaque window handle owned by the windowing adapter.
pub type WindowId = u32;

/// One workspace instance: a desktop on a screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub desktop: u32,
    pub screen: u32,
}

impl Location {
    pub fn new(desktop: u32, screen: u32) -> Self {
        Self { desktop, screen }
    }
}

/// Frame decoration sizes added by the window manager and/or the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extents {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

/// Everything the adapter reports about a window at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// Application class (`WM_CLASS`).
    pub class: String,
    /// Window title.
    pub title: String,
    /// EWMH window types, e.g. `_NET_WM_WINDOW_TYPE_NORMAL`.
    pub types: Vec<String>,
    /// EWMH window states, e.g. `_NET_WM_STATE_MAXIMIZED_VERT`.
    pub states: Vec<String>,
    pub location: Location,
    /// Outer geometry, decorations included.
    pub geometry: Rect,
    pub extents: Extents,
    /// Whether the window currently asks for decorations.
    pub decorated: bool,
}

pub const STATE_FULLSCREEN: &str = "_NET_WM_STATE_FULLSCREEN";
pub const STATE_MAXIMIZED_VERT: &str = "_NET_WM_STATE_MAXIMIZED_VERT";
pub const STATE_MAXIMIZED_HORZ: &str = "_NET_WM_STATE_MAXIMIZED_HORZ";
pub const STATE_HIDDEN: &str = "_NET_WM_STATE_HIDDEN";
pub const STATE_STICKY: &str = "_NET_WM_STATE_STICKY";

/// Window types that are never tiled.
const SPECIAL_TYPES: &[&str] = &[
    "_NET_WM_WINDOW_TYPE_DOCK",
    "_NET_WM_WINDOW_TYPE_DESKTOP",
    "_NET_WM_WINDOW_TYPE_TOOLBAR",
    "_NET_WM_WINDOW_TYPE_UTILITY",
    "_NET_WM_WINDOW_TYPE_TOOLTIP",
    "_NET_WM_WINDOW_TYPE_SPLASH",
    "_NET_WM_WINDOW_TYPE_DIALOG",
    "_NET_WM_WINDOW_TYPE_COMBO",
    "_NET_WM_WINDOW_TYPE_NOTIFICATION",
    "_NET_WM_WINDOW_TYPE_DROPDOWN_MENU",
    "_NET_WM_WINDOW_TYPE_POPUP_MENU",
    "_NET_WM_WINDOW_TYPE_MENU",
    "_NET_WM_WINDOW_TYPE_DND",
];

/// Window states that take a window out of tiling.
const SPECIAL_STATES: &[&str] = &[
    STATE_HIDDEN,
    "_NET_WM_STATE_MODAL",
    "_NET_WM_STATE_ABOVE",
    "_NET_WM_STATE_BELOW",
    "_NET_WM_STATE_SKIP_PAGER",
    "_NET_WM_STATE_SKIP_TASKBAR",
];

impl Info {
    pub fn has_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.has_state(STATE_FULLSCREEN)
    }

    pub fn is_maximized(&self) -> bool {
        self.has_state(STATE_MAXIMIZED_VERT) || self.has_state(STATE_MAXIMIZED_HORZ)
    }

    pub fn is_sticky(&self) -> bool {
        self.has_state(STATE_STICKY)
    }

    /// Docks, dialogs, menus, hidden windows and the like.
    pub fn is_special(&self) -> bool {
        if let Some(t) = self.types.iter().find(|t| SPECIAL_TYPES.contains(&t.as_str())) {
            debug!("ignore window with type {} [{}]", t, self.class);
            return true;
        }
        if let Some(s) = self.states.iter().find(|s| SPECIAL_STATES.contains(&s.as_str())) {
            debug!("ignore window with state {} [{}]", s, self.class);
            return true;
        }
        false
    }
}

/// Manual-move lock.
///
/// Locked right before the tracker issues a programmatic move/resize and
/// released by the next geometry notification for the window, which is then
/// discarded.  A latch older than the configured timeout no longer
/// discards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latch {
    locked_at: Option<Instant>,
}

impl Latch {
    pub fn lock(&mut self, now: Instant) {
        self.locked_at = Some(now);
    }

    pub fn unlock(&mut self) {
        self.locked_at = None;
    }

    pub fn is_locked(&self) -> bool {
        self.locked_at.is_some()
    }

    /// Consume one geometry notification.
    ///
    /// Returns `true` when the notification must be discarded.  The latch is
    /// open afterwards in every case.
    pub fn release(&mut self, now: Instant, timeout: Option<Duration>) -> bool {
        match (self.locked_at.take(), timeout) {
            (None, _) => false,
            (Some(at), Some(timeout)) => now.saturating_duration_since(at) <= timeout,
            (Some(_), None) => true,
        }
    }
}

/// A tracked window.
#[derive(Debug, Clone)]
pub struct Client {
    pub window: WindowId,
    pub original: Info,
    pub cached: Info,
    pub latest: Info,
    pub latch: Latch,
}

impl Client {
    /// Start tracking `window`, all three snapshots set to `info`.
    pub fn new(window: WindowId, info: Info) -> Self {
        Self {
            window,
            original: info.clone(),
            cached: info.clone(),
            latest: info,
            latch: Latch::default(),
        }
    }

    /// Seed the `cached` snapshot from a cache entry written by an earlier
    /// session: its states, geometry and screen replace the live ones.
    pub fn apply_cache(&mut self, entry: &Info) {
        self.cached.states = entry.states.clone();
        self.cached.geometry = entry.geometry;
        self.cached.location.screen = entry.location.screen;
    }

    /// Replace the `latest` snapshot.  Answers with an empty class come from
    /// windows that are already gone and are dropped.
    pub fn update(&mut self, info: Info) -> bool {
        if info.class.is_empty() {
            return false;
        }
        self.latest = info;
        true
    }

    pub fn class(&self) -> &str {
        &self.latest.class
    }

    pub fn location(&self) -> Location {
        self.latest.location
    }

    pub fn geometry(&self) -> Rect {
        self.latest.geometry
    }
}

/// User supplied `(class, title)` regex pairs of windows never to tile.
///
/// A window is ignored when its class matches and the title pattern is
/// empty or does not match; the title pattern whitelists single windows of
/// an otherwise ignored class.  Matching is case-insensitive.
#[derive(Debug, Default)]
pub struct IgnoreList {
    specs: Vec<(Regex, Option<Regex>)>,
}

impl IgnoreList {
    /// Compile the pairs.  Invalid patterns are logged and skipped.
    pub fn new(pairs: &[(String, String)]) -> Self {
        let compile = |pattern: &str| match Regex::new(&format!("(?i){}", pattern)) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!("invalid window_ignore pattern {:?}: {}", pattern, e);
                None
            }
        };
        let specs = pairs
            .iter()
            .filter_map(|(class, title)| {
                let class = compile(class)?;
                let title = if title.is_empty() {
                    None
                } else {
                    Some(compile(title)?)
                };
                Some((class, title))
            })
            .collect();
        Self { specs }
    }

    pub fn is_ignored(&self, info: &Info) -> bool {
        if info.class.is_empty() {
            debug!("ignore window without class");
            return true;
        }
        self.specs.iter().any(|(class, title)| {
            let class_match = class.is_match(&info.class);
            let title_match = title.as_ref().is_some_and(|t| t.is_match(&info.title));
            if class_match && !title_match {
                debug!("ignore window {:?} [{}] from config", info.title, info.class);
                return true;
            }
            false
        })
    }

    /// Whether a window should be tiled at all.
    pub fn accepts(&self, info: &Info) -> bool {
        !info.is_special() && !self.is_ignored(info)
    }
}
