//! Core traits that decouple ewtile from any specific windowing protocol,
//! event transport or storage.
//!
//! Every concrete backend (the EWMH adapter, the Unix-socket listener, the
//! file cache, a test harness, …) implements one of these traits.  The
//! [`Tracker`](crate::tracker::Tracker) only depends on these abstractions.

use crate::client::{Info, WindowId};
use crate::command::Event;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;

/// Abstraction over an EWMH-style window manager.
///
/// Besides window queries and requests it doubles as the desktop geometry
/// provider ([`screens`](WindowManager::screens),
/// [`desktop_dimensions`](WindowManager::desktop_dimensions)).
///
/// Requests may be buffered by the implementation; the tracker calls
/// [`flush`](WindowManager::flush) once per placement pass.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Managed top-level windows, in stacking or mapping order.
    fn client_list(&self) -> Result<Vec<WindowId>, Self::Error>;

    /// Query everything known about `window`.
    fn window_info(&self, window: WindowId) -> Result<Info, Self::Error>;

    /// Move and resize `window` so its *outer* geometry, frame included,
    /// becomes `geometry`.
    fn move_resize(&self, window: WindowId, geometry: Rect) -> Result<(), Self::Error>;

    /// Add (`enabled`) or remove an EWMH state such as
    /// `_NET_WM_STATE_MAXIMIZED_VERT`.
    fn set_state(&self, window: WindowId, state: &str, enabled: bool) -> Result<(), Self::Error>;

    /// Ask the window manager to draw (or drop) the window's decorations.
    fn set_decorated(&self, window: WindowId, decorated: bool) -> Result<(), Self::Error>;

    /// Focus and raise `window`.
    fn activate(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Subscribe to geometry and state notifications of `window`.
    fn watch(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Currently focused window, `None` if nothing has focus.
    fn active_window(&self) -> Result<Option<WindowId>, Self::Error>;

    fn current_desktop(&self) -> Result<u32, Self::Error>;

    /// Whether a pointer button is held down right now.
    fn pointer_pressed(&self) -> Result<bool, Self::Error>;

    /// Geometry of every screen, panels included.  Index is the screen
    /// number used in [`Location`](crate::client::Location).
    fn screens(&self) -> Result<Vec<Rect>, Self::Error>;

    /// Area of `screen` available to windows, i.e. without panels.
    fn desktop_dimensions(&self, screen: u32) -> Result<Rect, Self::Error>;

    /// Push buffered requests to the server.
    fn flush(&self) -> Result<(), Self::Error>;
}

//  Event Source

/// A source of [`Event`]s.
///
/// Implementations listen on some transport (the X server's event stream,
/// a Unix socket, an in-memory channel) and forward what they observe
/// into the provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each observed event must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Event`] into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error>;
}

//  Cache Store

/// Key of one cached client snapshot.
///
/// `workplace` identifies the monitor arrangement (see
/// [`workplace_id`]), so the same application can remember a different
/// geometry per setup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub workplace: String,
    pub class: String,
    pub desktop: u32,
}

impl CacheKey {
    pub fn new(workplace: &str, info: &Info) -> Self {
        Self {
            workplace: workplace.to_string(),
            class: info.class.clone(),
            desktop: info.location.desktop,
        }
    }
}

/// Name of a screen arrangement, e.g. `"1920x1080+0+0_2560x1440+1920+0"`.
pub fn workplace_id(screens: &[Rect]) -> String {
    screens
        .iter()
        .map(|s| format!("{}x{}+{}+{}", s.w, s.h, s.x, s.y))
        .collect::<Vec<_>>()
        .join("_")
}

/// Persistent store of client snapshots, read at first sight of a window
/// and used to restore it when tiling is turned off.
pub trait CacheStore {
    /// The error type produced by this store.
    type Error: std::error::Error + Send + 'static;

    /// `None` when nothing was stored under `key`.
    fn read(&self, key: &CacheKey) -> Result<Option<Info>, Self::Error>;

    fn write(&self, key: &CacheKey, info: &Info) -> Result<(), Self::Error>;
}
