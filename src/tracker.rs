//! The main orchestrator that ties clients, workspaces and the window
//! manager together.
//!
//! [`Tracker`] owns the process-wide client table and one [`Workspace`] per
//! [`Location`].  It reacts to [`Event`]s by updating that model and marking
//! workspaces as pending; [`Tracker::flush`] then runs one placement pass
//! per pending workspace.  Event sources never touch the model directly, so
//! all mutation happens on the thread that owns the tracker.

use crate::client::{
    Client, IgnoreList, Info, Location, WindowId, STATE_FULLSCREEN, STATE_MAXIMIZED_HORZ, STATE_MAXIMIZED_VERT,
    STATE_STICKY,
};
use crate::command::{Command, Event};
use crate::config::Config;
use crate::geometry::Rect;
use crate::layout::LayoutKind;
use crate::manager::ManagerSettings;
use crate::traits::{workplace_id, CacheKey, CacheStore, WindowManager};
use crate::workspace::{Outcome, TilingState, Workspace};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Instant;

/// Possible errors from the tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The window manager returned an error.
    #[error("window manager error: {0}")]
    WindowManager(String),
}

fn wm_err<E: std::error::Error>(e: E) -> TrackerError {
    TrackerError::WindowManager(e.to_string())
}

/// Keeps windows tiled.
///
/// The tracker is generic over any [`WindowManager`] and [`CacheStore`],
/// making it independent of X11 and of the filesystem.
///
/// # Typical usage
///
/// ```ignore
/// let mut tracker = Tracker::new(EwmhWm::connect()?, FileCache::new(root), &config);
/// tracker.start()?;
/// tracker.handle(Event::Command(Command::CycleNext))?;
/// tracker.flush()?;
/// ```
pub struct Tracker<W: WindowManager, C: CacheStore> {
    wm: W,
    cache: C,
    config: Config,
    layout: LayoutKind,
    settings: ManagerSettings,
    ignore: IgnoreList,
    /// Identifier of the current screen arrangement, part of cache keys.
    workplace: String,
    clients: HashMap<WindowId, Client>,
    workspaces: BTreeMap<Location, Workspace>,
    pending: BTreeSet<Location>,
    cache_writes: BTreeSet<WindowId>,
}

impl<W: WindowManager, C: CacheStore> Tracker<W, C> {
    pub fn new(wm: W, cache: C, config: &Config) -> Self {
        Self {
            wm,
            cache,
            layout: config.layout(),
            settings: config.manager_settings(),
            ignore: IgnoreList::new(&config.window_ignore),
            config: config.clone(),
            workplace: String::new(),
            clients: HashMap::new(),
            workspaces: BTreeMap::new(),
            pending: BTreeSet::new(),
            cache_writes: BTreeSet::new(),
        }
    }

    /// Return a shared reference to the underlying window manager.
    pub fn wm(&self) -> &W {
        &self.wm
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn client(&self, window: WindowId) -> Option<&Client> {
        self.clients.get(&window)
    }

    /// Geometry the window manager last reported for `window`.
    pub fn geometry(&self, window: WindowId) -> Option<Rect> {
        self.clients.get(&window).map(Client::geometry)
    }

    pub fn workspace(&self, location: Location) -> Option<&Workspace> {
        self.workspaces.get(&location)
    }

    /// Whether a placement pass is waiting for [`flush`](Self::flush).
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || !self.cache_writes.is_empty()
    }

    /// Read the screen arrangement and pick up every existing window.
    pub fn start(&mut self) -> Result<(), TrackerError> {
        self.refresh_workplace()?;
        self.sync()
    }

    /// Process a single [`Event`].
    ///
    /// Failures to reach a single window are logged and skip that window;
    /// only failures of global queries are returned.
    pub fn handle(&mut self, event: Event) -> Result<(), TrackerError> {
        match event {
            Event::ClientListChanged => self.sync()?,
            Event::WindowConfigured(window) => self.configured(window)?,
            Event::WindowStateChanged(window) => self.state_changed(window),
            Event::ActiveWindowChanged => {
                let active = self.wm.active_window().map_err(wm_err)?;
                if let Some(client) = active.and_then(|w| self.clients.get(&w)) {
                    self.pending.insert(client.location());
                }
            }
            Event::DesktopChanged => {
                let desktop = self.wm.current_desktop().map_err(wm_err)?;
                debug!("desktop {} is current", desktop);
                let visible = self.workspaces.keys().filter(|l| l.desktop == desktop);
                self.pending.extend(visible);
            }
            Event::TopologyChanged => self.reload()?,
            Event::Command(cmd) => self.command(cmd)?,
        }
        Ok(())
    }

    /// Run every pending placement pass, then write queued cache entries.
    ///
    /// While a pointer button is held the passes are deferred, so windows
    /// are not pulled away from a user who is still dragging.  A failed pass
    /// is logged and does not stop the others.
    pub fn flush(&mut self) -> Result<(), TrackerError> {
        if !self.pending.is_empty() && self.wm.pointer_pressed().map_err(wm_err)? {
            debug!("pointer pressed, deferring {} pass(es)", self.pending.len());
            return Ok(());
        }
        for location in std::mem::take(&mut self.pending) {
            if let Err(e) = self.tile(location) {
                warn!("placement of {:?} failed: {}", location, e);
            }
        }
        self.write_cache();
        Ok(())
    }

    //  Client list

    /// Bring the client table in line with the window manager's list.
    fn sync(&mut self) -> Result<(), TrackerError> {
        let list = self.wm.client_list().map_err(wm_err)?;
        let listed: HashSet<WindowId> = list.iter().copied().collect();

        let gone: Vec<WindowId> = self
            .clients
            .keys()
            .filter(|w| !listed.contains(w))
            .copied()
            .collect();
        for window in gone {
            self.untrack(window);
        }
        for window in list {
            if !self.clients.contains_key(&window) {
                self.track(window);
            }
        }
        Ok(())
    }

    fn track(&mut self, window: WindowId) {
        // Watch first so a window that is special now is seen again once
        // its state changes.
        if let Err(e) = self.wm.watch(window) {
            debug!("cannot watch window {}: {}", window, e);
            return;
        }
        let info = match self.wm.window_info(window) {
            Ok(info) => info,
            Err(e) => {
                debug!("skip window {}: {}", window, e);
                return;
            }
        };
        if !self.ignore.accepts(&info) {
            return;
        }

        let mut client = Client::new(window, info);
        self.load_cache(&mut client);
        let location = client.location();
        info!("track window {} [{}] on {:?}", window, client.class(), location);
        self.clients.insert(window, client);
        let ws = self.workspace_mut(location);
        let added = ws.add_client(window);
        let disabled = ws.state() == TilingState::Disabled;
        if added {
            self.pending.insert(location);
        }
        // Not tiled here: put it where it was last session.
        if disabled && self.restore_client(window, Instant::now()) {
            if let Err(e) = self.wm.flush() {
                debug!("cannot flush restore of window {}: {}", window, e);
            }
        }
    }

    fn untrack(&mut self, window: WindowId) {
        let Some(client) = self.clients.remove(&window) else {
            return;
        };
        info!("untrack window {} [{}]", window, client.class());
        for (location, ws) in self.workspaces.iter_mut() {
            if ws.remove_client(window) {
                self.pending.insert(*location);
            }
        }
        self.cache_writes.remove(&window);
    }

    fn workspace_mut(&mut self, location: Location) -> &mut Workspace {
        self.workspaces.entry(location).or_insert_with(|| {
            debug!("new workspace {:?}", location);
            Workspace::new(location, self.layout, self.settings, self.config.tiling_enabled)
        })
    }

    /// Screens were added, removed or resized: rebuild every workspace.
    fn reload(&mut self) -> Result<(), TrackerError> {
        info!("screen layout changed, rebuilding workspaces");
        self.refresh_workplace()?;
        self.workspaces.clear();
        self.pending.clear();

        let mut windows: Vec<WindowId> = self.clients.keys().copied().collect();
        windows.sort_unstable();
        for window in windows {
            let info = self.wm.window_info(window).ok();
            let Some(client) = self.clients.get_mut(&window) else {
                continue;
            };
            if !info.is_some_and(|i| client.update(i)) {
                self.clients.remove(&window);
                continue;
            }
            let location = client.location();
            self.workspace_mut(location).add_client(window);
            self.pending.insert(location);
        }
        self.sync()
    }

    fn refresh_workplace(&mut self) -> Result<(), TrackerError> {
        let screens = self.wm.screens().map_err(wm_err)?;
        self.workplace = workplace_id(&screens);
        info!("workplace {} ({} screen(s))", self.workplace, screens.len());
        Ok(())
    }

    //  Window notifications

    fn configured(&mut self, window: WindowId) -> Result<(), TrackerError> {
        let timeout = self.config.lock_timeout();
        let Some(client) = self.clients.get_mut(&window) else {
            return Ok(());
        };

        if client.latch.release(Instant::now(), timeout) {
            debug!("discard own configure of window {}", window);
            if let Ok(info) = self.wm.window_info(window) {
                client.update(info);
            }
            return Ok(());
        }

        let info = match self.wm.window_info(window) {
            Ok(info) => info,
            Err(e) => {
                debug!("skip window {}: {}", window, e);
                return Ok(());
            }
        };
        if !self.ignore.accepts(&info) {
            self.untrack(window);
            return Ok(());
        }

        let old = client.latest.clone();
        if !client.update(info) {
            return Ok(());
        }
        let new = client.latest.clone();

        if old.location != new.location {
            self.migrate(window, old.location, new.location);
            return Ok(());
        }
        if old.geometry == new.geometry {
            return Ok(());
        }

        let location = new.location;
        let state = match self.workspaces.get(&location) {
            Some(ws) => ws.state(),
            None => return Ok(()),
        };
        match state {
            TilingState::Active => {
                if !old.geometry.same_size(&new.geometry) && self.wm.pointer_pressed().map_err(wm_err)? {
                    let area = self.wm.desktop_dimensions(location.screen).map_err(wm_err)?;
                    let gap = self.config.window_gap_size;
                    if let Some(ws) = self.workspaces.get_mut(&location) {
                        if ws.update_proportions(window, old.geometry, new.geometry, area, gap) {
                            info!("proportions of {:?} follow window {}", location, window);
                        }
                    }
                }
                // Re-tile either way: a plain move snaps back into place.
                self.pending.insert(location);
            }
            TilingState::Disabled => {
                if let Some(client) = self.clients.get_mut(&window) {
                    client.cached.geometry = new.geometry;
                    client.cached.states = new.states.clone();
                    self.cache_writes.insert(window);
                }
            }
            TilingState::Empty => {}
        }
        Ok(())
    }

    /// Move `window` from the workspace at `from` to the one at `to`.
    fn migrate(&mut self, window: WindowId, from: Location, to: Location) {
        info!("window {} moved from {:?} to {:?}", window, from, to);
        if let Some(ws) = self.workspaces.get_mut(&from) {
            if ws.remove_client(window) {
                self.pending.insert(from);
            }
        }
        if self.workspace_mut(to).add_client(window) {
            self.pending.insert(to);
        }
    }

    fn state_changed(&mut self, window: WindowId) {
        if !self.clients.contains_key(&window) {
            // Possibly a window that was hidden or special when first seen.
            self.track(window);
            return;
        }
        let info = match self.wm.window_info(window) {
            Ok(info) => info,
            Err(e) => {
                debug!("skip window {}: {}", window, e);
                return;
            }
        };
        if !self.ignore.accepts(&info) {
            self.untrack(window);
            return;
        }
        let Some(client) = self.clients.get_mut(&window) else {
            return;
        };
        let from = client.location();
        if client.update(info) && client.location() != from {
            let to = client.location();
            self.migrate(window, from, to);
        }
    }

    //  Commands

    fn command(&mut self, cmd: Command) -> Result<(), TrackerError> {
        let active = self.wm.active_window().map_err(wm_err)?;
        let location = match active.and_then(|w| self.clients.get(&w)) {
            Some(client) => client.location(),
            None => Location::new(self.wm.current_desktop().map_err(wm_err)?, 0),
        };
        info!("{} on {:?}", cmd, location);

        match self.workspace_mut(location).execute(cmd, active) {
            Outcome::Nothing => {}
            Outcome::Retile => {
                self.pending.insert(location);
            }
            Outcome::Restore => self.restore(location)?,
            Outcome::Focus(window) => self.wm.activate(window).map_err(wm_err)?,
        }
        Ok(())
    }

    //  Placement

    /// One placement pass over the workspace at `location`.
    fn tile(&mut self, location: Location) -> Result<(), TrackerError> {
        let Some(ws) = self.workspaces.get(&location) else {
            return Ok(());
        };
        if !ws.is_tiling() {
            return Ok(());
        }
        let area = match self.wm.desktop_dimensions(location.screen) {
            Ok(area) => area,
            Err(e) => {
                warn!("no desktop dimensions for {:?}: {}", location, e);
                return Ok(());
            }
        };
        let placements = ws.arrange(area, self.config.window_gap_size);
        if placements.is_empty() {
            return Ok(());
        }
        info!(
            "tile {:?} with {} ({} client(s))",
            location,
            ws.layout().name(),
            placements.len()
        );

        let strip = !self.config.window_decoration;
        let now = Instant::now();
        for placement in placements {
            let Some(client) = self.clients.get_mut(&placement.window) else {
                continue;
            };
            let window = placement.window;
            if strip && client.latest.decorated {
                match self.wm.set_decorated(window, false) {
                    Ok(()) => client.latest.decorated = false,
                    Err(e) => debug!("cannot undecorate window {}: {}", window, e),
                }
            }
            unmaximize(&self.wm, client);
            if client.latest.geometry == placement.geometry {
                continue;
            }
            debug!("place window {} at {:?}", window, placement.geometry);
            client.latch.lock(now);
            match self.wm.move_resize(window, placement.geometry) {
                Ok(()) => client.latest.geometry = placement.geometry,
                Err(e) => {
                    client.latch.unlock();
                    warn!("skip window {} [{}]: {}", window, client.class(), e);
                }
            }
        }
        self.wm.flush().map_err(wm_err)
    }

    /// Put every client of the workspace at `location` back to its cached
    /// geometry and decorations.
    fn restore(&mut self, location: Location) -> Result<(), TrackerError> {
        let Some(ws) = self.workspaces.get(&location) else {
            return Ok(());
        };
        let windows = ws.clients();
        if windows.is_empty() {
            return Ok(());
        }
        info!("restore {} client(s) on {:?}", windows.len(), location);

        let now = Instant::now();
        for window in windows {
            self.restore_client(window, now);
        }
        self.wm.flush().map_err(wm_err)
    }

    /// Give `window` its cached decorations, states and geometry back.
    /// Returns whether any request was sent.
    fn restore_client(&mut self, window: WindowId, now: Instant) -> bool {
        let Some(client) = self.clients.get_mut(&window) else {
            return false;
        };
        let cached = client.cached.clone();
        let before = client.latest.clone();
        if cached.decorated != client.latest.decorated {
            match self.wm.set_decorated(window, cached.decorated) {
                Ok(()) => client.latest.decorated = cached.decorated,
                Err(e) => debug!("cannot redecorate window {}: {}", window, e),
            }
        }
        if cached.is_sticky() && !client.latest.is_sticky() {
            match self.wm.set_state(window, STATE_STICKY, true) {
                Ok(()) => client.latest.states.push(STATE_STICKY.to_string()),
                Err(e) => debug!("cannot make window {} sticky: {}", window, e),
            }
        }
        if !cached.is_maximized() && !cached.is_fullscreen() {
            unmaximize(&self.wm, client);
        }
        if cached.geometry == client.latest.geometry {
            return client.latest != before;
        }
        client.latch.lock(now);
        match self.wm.move_resize(window, cached.geometry) {
            Ok(()) => client.latest.geometry = cached.geometry,
            Err(e) => {
                client.latch.unlock();
                warn!("cannot restore window {}: {}", window, e);
            }
        }
        true
    }

    //  Cache

    fn load_cache(&mut self, client: &mut Client) {
        if !self.config.cache_windows {
            return;
        }
        let key = CacheKey::new(&self.workplace, &client.original);
        match self.cache.read(&key) {
            Ok(Some(entry)) => {
                debug!("cached state for [{}]", client.class());
                client.apply_cache(&entry);
            }
            Ok(None) => {
                self.cache_writes.insert(client.window);
            }
            Err(e) => warn!("cache read failed for [{}]: {}", client.class(), e),
        }
    }

    fn write_cache(&mut self) {
        let writes = std::mem::take(&mut self.cache_writes);
        if !self.config.cache_windows {
            return;
        }
        for window in writes {
            let Some(client) = self.clients.get(&window) else {
                continue;
            };
            let entry: &Info = &client.cached;
            let key = CacheKey::new(&self.workplace, entry);
            if let Err(e) = self.cache.write(&key, entry) {
                warn!("cache write failed for [{}]: {}", client.class(), e);
            }
        }
    }
}

/// Drop the maximized and fullscreen states, which pin a window's size.
fn unmaximize<W: WindowManager>(wm: &W, client: &mut Client) {
    if !client.latest.is_maximized() && !client.latest.is_fullscreen() {
        return;
    }
    for state in [STATE_MAXIMIZED_VERT, STATE_MAXIMIZED_HORZ, STATE_FULLSCREEN] {
        if client.latest.has_state(state) {
            if let Err(e) = wm.set_state(client.window, state, false) {
                debug!("cannot remove {} from window {}: {}", state, client.window, e);
            }
            client.latest.states.retain(|s| s != state);
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{STATE_HIDDEN, STATE_STICKY};
    use std::cell::{Cell, RefCell};

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        w: 1920,
        h: 1080,
    };

    /// Record-keeping mock window manager.  Moves are applied to the stored
    /// window table, like a real window manager would.
    #[derive(Debug, Default)]
    struct RecorderWm {
        windows: RefCell<BTreeMap<WindowId, Info>>,
        moves: RefCell<Vec<(WindowId, Rect)>>,
        decorations: RefCell<Vec<(WindowId, bool)>>,
        states: RefCell<Vec<(WindowId, String, bool)>>,
        activated: RefCell<Vec<WindowId>>,
        failing: RefCell<HashSet<WindowId>>,
        active: Cell<Option<WindowId>>,
        pressed: Cell<bool>,
        flushes: Cell<usize>,
        flush_fails: Cell<bool>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("recorder error")]
    struct RecorderErr;

    impl RecorderWm {
        fn with_windows(n: u32) -> Self {
            let wm = Self::default();
            for w in 1..=n {
                wm.add(w, "xterm", Rect::new(100 * w as i32, 100, 400, 300));
            }
            wm
        }

        fn add(&self, window: WindowId, class: &str, geometry: Rect) {
            let info = Info {
                class: class.into(),
                title: format!("window {}", window),
                types: vec!["_NET_WM_WINDOW_TYPE_NORMAL".into()],
                location: Location::new(0, 0),
                geometry,
                decorated: true,
                ..Info::default()
            };
            self.windows.borrow_mut().insert(window, info);
        }

        fn edit(&self, window: WindowId, f: impl FnOnce(&mut Info)) {
            if let Some(info) = self.windows.borrow_mut().get_mut(&window) {
                f(info);
            }
        }

        fn moves_of(&self, window: WindowId) -> Vec<Rect> {
            self.moves
                .borrow()
                .iter()
                .filter(|(w, _)| *w == window)
                .map(|(_, r)| *r)
                .collect()
        }
    }

    impl WindowManager for RecorderWm {
        type Error = RecorderErr;

        fn client_list(&self) -> Result<Vec<WindowId>, RecorderErr> {
            Ok(self.windows.borrow().keys().copied().collect())
        }

        fn window_info(&self, window: WindowId) -> Result<Info, RecorderErr> {
            self.windows.borrow().get(&window).cloned().ok_or(RecorderErr)
        }

        fn move_resize(&self, window: WindowId, geometry: Rect) -> Result<(), RecorderErr> {
            if self.failing.borrow().contains(&window) {
                return Err(RecorderErr);
            }
            self.moves.borrow_mut().push((window, geometry));
            self.edit(window, |i| i.geometry = geometry);
            Ok(())
        }

        fn set_state(&self, window: WindowId, state: &str, enabled: bool) -> Result<(), RecorderErr> {
            self.states.borrow_mut().push((window, state.into(), enabled));
            Ok(())
        }

        fn set_decorated(&self, window: WindowId, decorated: bool) -> Result<(), RecorderErr> {
            self.decorations.borrow_mut().push((window, decorated));
            self.edit(window, |i| i.decorated = decorated);
            Ok(())
        }

        fn activate(&self, window: WindowId) -> Result<(), RecorderErr> {
            self.activated.borrow_mut().push(window);
            Ok(())
        }

        fn watch(&self, _window: WindowId) -> Result<(), RecorderErr> {
            Ok(())
        }

        fn active_window(&self) -> Result<Option<WindowId>, RecorderErr> {
            Ok(self.active.get())
        }

        fn current_desktop(&self) -> Result<u32, RecorderErr> {
            Ok(0)
        }

        fn pointer_pressed(&self) -> Result<bool, RecorderErr> {
            Ok(self.pressed.get())
        }

        fn screens(&self) -> Result<Vec<Rect>, RecorderErr> {
            Ok(vec![SCREEN])
        }

        fn desktop_dimensions(&self, _screen: u32) -> Result<Rect, RecorderErr> {
            Ok(SCREEN)
        }

        fn flush(&self) -> Result<(), RecorderErr> {
            self.flushes.set(self.flushes.get() + 1);
            if self.flush_fails.get() {
                return Err(RecorderErr);
            }
            Ok(())
        }
    }

    /// In-memory cache store.
    #[derive(Debug, Default)]
    struct MemoryCache {
        entries: RefCell<HashMap<CacheKey, Info>>,
    }

    impl CacheStore for MemoryCache {
        type Error = RecorderErr;

        fn read(&self, key: &CacheKey) -> Result<Option<Info>, RecorderErr> {
            Ok(self.entries.borrow().get(key).cloned())
        }

        fn write(&self, key: &CacheKey, info: &Info) -> Result<(), RecorderErr> {
            self.entries.borrow_mut().insert(key.clone(), info.clone());
            Ok(())
        }
    }

    const HOME: Location = Location {
        desktop: 0,
        screen: 0,
    };

    fn make_tracker(wm: RecorderWm) -> Tracker<RecorderWm, MemoryCache> {
        make_tracker_with(wm, MemoryCache::default(), Config::default())
    }

    fn make_tracker_with(wm: RecorderWm, cache: MemoryCache, config: Config) -> Tracker<RecorderWm, MemoryCache> {
        let mut tracker = Tracker::new(wm, cache, &config);
        tracker.start().unwrap();
        tracker
    }

    /// Deliver the configure notifications our own moves cause.
    fn settle(tracker: &mut Tracker<RecorderWm, MemoryCache>) {
        let moved: Vec<WindowId> = tracker.wm().moves.borrow().iter().map(|(w, _)| *w).collect();
        for w in moved {
            tracker.handle(Event::WindowConfigured(w)).unwrap();
        }
    }

    #[test]
    fn empty_desktop_issues_no_calls() {
        let mut tracker = make_tracker(RecorderWm::default());
        tracker.flush().unwrap();
        assert!(tracker.wm().moves.borrow().is_empty());
        assert_eq!(tracker.wm().flushes.get(), 0);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn first_pass_tiles_every_client() {
        let mut tracker = make_tracker(RecorderWm::with_windows(4));
        assert!(tracker.has_pending());
        tracker.flush().unwrap();

        let wm = tracker.wm();
        assert_eq!(wm.moves.borrow().len(), 4);
        assert_eq!(wm.flushes.get(), 1);
        assert_eq!(wm.moves_of(1), vec![Rect::new(5, 5, 950, 1070)]);
        for w in 2..=4 {
            let r = wm.moves_of(w)[0];
            assert_eq!((r.x, r.w), (960, 955));
        }
        assert_eq!(tracker.workspace(HOME).unwrap().state(), TilingState::Active);
    }

    #[test]
    fn passes_are_idempotent() {
        let mut tracker = make_tracker(RecorderWm::with_windows(3));
        tracker.flush().unwrap();
        settle(&mut tracker);
        let before = tracker.wm().moves.borrow().len();

        tracker.wm().active.set(Some(2));
        tracker.handle(Event::ActiveWindowChanged).unwrap();
        assert!(tracker.has_pending());
        tracker.flush().unwrap();
        assert_eq!(tracker.wm().moves.borrow().len(), before);
    }

    #[test]
    fn own_configure_notifications_are_discarded() {
        let mut tracker = make_tracker(RecorderWm::with_windows(2));
        tracker.flush().unwrap();
        assert!(tracker.client(1).unwrap().latch.is_locked());

        let before = tracker.workspace(HOME).unwrap().manager().proportions.clone();
        tracker.wm().pressed.set(true);
        tracker.handle(Event::WindowConfigured(1)).unwrap();

        assert!(!tracker.client(1).unwrap().latch.is_locked());
        assert!(!tracker.has_pending());
        assert_eq!(tracker.workspace(HOME).unwrap().manager().proportions, before);
    }

    #[test]
    fn manual_resize_updates_master_share() {
        let mut tracker = make_tracker(RecorderWm::with_windows(2));
        tracker.flush().unwrap();
        settle(&mut tracker);

        // User drags the master's right edge to 70 % of the screen.
        tracker.wm().pressed.set(true);
        tracker.wm().edit(1, |i| i.geometry = Rect::new(5, 5, 1334, 1070));
        tracker.handle(Event::WindowConfigured(1)).unwrap();

        let props = &tracker.workspace(HOME).unwrap().manager().proportions;
        assert!((props.master_slave[0] - 0.7).abs() < 1e-9);

        // Nothing moves while the button is held.
        tracker.flush().unwrap();
        assert!(tracker.has_pending());
        tracker.wm().pressed.set(false);
        tracker.flush().unwrap();
        assert_eq!(tracker.wm().moves_of(2).last(), Some(&Rect::new(1344, 5, 571, 1070)));
    }

    #[test]
    fn resize_without_pointer_is_not_a_drag() {
        let mut tracker = make_tracker(RecorderWm::with_windows(2));
        tracker.flush().unwrap();
        settle(&mut tracker);

        tracker.wm().edit(1, |i| i.geometry = Rect::new(5, 5, 900, 1070));
        tracker.handle(Event::WindowConfigured(1)).unwrap();
        let props = &tracker.workspace(HOME).unwrap().manager().proportions;
        assert!((props.master_slave[0] - 0.5).abs() < 1e-9);

        tracker.flush().unwrap();
        assert_eq!(tracker.wm().moves_of(1).last(), Some(&Rect::new(5, 5, 950, 1070)));
    }

    #[test]
    fn moved_window_snaps_back() {
        let mut tracker = make_tracker(RecorderWm::with_windows(3));
        tracker.flush().unwrap();
        settle(&mut tracker);
        let slot = tracker.geometry(2).unwrap();

        tracker.wm().edit(2, |i| i.geometry = Rect::new(300, 300, slot.w, slot.h));
        tracker.handle(Event::WindowConfigured(2)).unwrap();
        tracker.flush().unwrap();
        assert_eq!(tracker.wm().moves_of(2).last(), Some(&slot));
    }

    #[test]
    fn make_master_swaps_roles() {
        let mut tracker = make_tracker(RecorderWm::with_windows(4));
        tracker.flush().unwrap();
        settle(&mut tracker);
        let master_slot = tracker.geometry(1).unwrap();

        tracker.wm().active.set(Some(3));
        tracker.handle(Event::Command(Command::MakeMaster)).unwrap();
        tracker.flush().unwrap();

        let manager = tracker.workspace(HOME).unwrap().manager();
        assert_eq!(manager.masters.clients, vec![3]);
        assert_eq!(manager.slaves.clients, vec![1, 2, 4]);
        assert_eq!(tracker.geometry(3), Some(master_slot));
    }

    #[test]
    fn untile_restores_pre_tiling_geometry() {
        let mut tracker = make_tracker(RecorderWm::with_windows(2));
        tracker.flush().unwrap();
        settle(&mut tracker);

        tracker.wm().active.set(Some(1));
        tracker.handle(Event::Command(Command::Untile)).unwrap();
        assert_eq!(tracker.workspace(HOME).unwrap().state(), TilingState::Disabled);
        assert_eq!(tracker.geometry(1), Some(Rect::new(100, 100, 400, 300)));
        assert_eq!(tracker.geometry(2), Some(Rect::new(200, 100, 400, 300)));

        // Disabled workspaces are never re-tiled.
        settle(&mut tracker);
        let before = tracker.wm().moves.borrow().len();
        tracker.handle(Event::ActiveWindowChanged).unwrap();
        tracker.flush().unwrap();
        assert_eq!(tracker.wm().moves.borrow().len(), before);
    }

    #[test]
    fn cached_geometry_wins_over_live_one() {
        let cache = MemoryCache::default();
        let entry = Info {
            class: "xterm".into(),
            geometry: Rect::new(11, 22, 333, 444),
            ..Info::default()
        };
        cache.write(&CacheKey::new(&workplace_id(&[SCREEN]), &entry), &entry).unwrap();

        let mut tracker = make_tracker_with(RecorderWm::with_windows(1), cache, Config::default());
        tracker.flush().unwrap();
        tracker.handle(Event::Command(Command::Untile)).unwrap();
        assert_eq!(tracker.geometry(1), Some(Rect::new(11, 22, 333, 444)));
    }

    #[test]
    fn unseen_clients_are_written_to_cache() {
        let mut tracker = make_tracker(RecorderWm::with_windows(1));
        tracker.flush().unwrap();
        let entries = tracker.cache().entries.borrow();
        assert_eq!(entries.len(), 1);
        let stored = entries.values().next().unwrap();
        assert_eq!(stored.geometry, Rect::new(100, 100, 400, 300));
    }

    #[test]
    fn cache_can_be_disabled() {
        let config = Config {
            cache_windows: false,
            ..Config::default()
        };
        let mut tracker = make_tracker_with(RecorderWm::with_windows(1), MemoryCache::default(), config);
        tracker.flush().unwrap();
        assert!(tracker.cache().entries.borrow().is_empty());
    }

    #[test]
    fn moves_while_disabled_update_the_cache() {
        let config = Config {
            tiling_enabled: false,
            ..Config::default()
        };
        let mut tracker = make_tracker_with(RecorderWm::with_windows(1), MemoryCache::default(), config);
        tracker.flush().unwrap();
        assert!(tracker.wm().moves.borrow().is_empty());

        tracker.wm().edit(1, |i| i.geometry = Rect::new(50, 60, 700, 500));
        tracker.handle(Event::WindowConfigured(1)).unwrap();
        tracker.flush().unwrap();

        assert_eq!(tracker.client(1).unwrap().cached.geometry, Rect::new(50, 60, 700, 500));
        let entries = tracker.cache().entries.borrow();
        assert_eq!(entries.values().next().unwrap().geometry, Rect::new(50, 60, 700, 500));
    }

    #[test]
    fn special_and_ignored_windows_are_not_tracked() {
        let wm = RecorderWm::with_windows(1);
        wm.add(2, "polybar", Rect::new(0, 0, 1920, 30));
        wm.edit(2, |i| i.types = vec!["_NET_WM_WINDOW_TYPE_DOCK".into()]);
        wm.add(3, "Gimp", Rect::new(0, 0, 100, 100));
        let config = Config {
            window_ignore: vec![("gimp".into(), "".into())],
            ..Config::default()
        };
        let tracker = make_tracker_with(wm, MemoryCache::default(), config);
        assert!(tracker.client(1).is_some());
        assert!(tracker.client(2).is_none());
        assert!(tracker.client(3).is_none());
    }

    #[test]
    fn minimised_window_is_untracked_and_comes_back() {
        let mut tracker = make_tracker(RecorderWm::with_windows(3));
        tracker.flush().unwrap();

        tracker.wm().edit(1, |i| i.states = vec![STATE_HIDDEN.into()]);
        tracker.handle(Event::WindowStateChanged(1)).unwrap();
        assert!(tracker.client(1).is_none());
        assert_eq!(tracker.workspace(HOME).unwrap().manager().masters.clients, vec![2]);

        tracker.wm().edit(1, |i| i.states.clear());
        tracker.handle(Event::WindowStateChanged(1)).unwrap();
        assert!(tracker.client(1).is_some());
        assert_eq!(tracker.workspace(HOME).unwrap().clients(), vec![2, 3, 1]);
    }

    #[test]
    fn closed_master_is_replaced_by_head_slave() {
        let mut tracker = make_tracker(RecorderWm::with_windows(3));
        tracker.flush().unwrap();
        settle(&mut tracker);
        let master_slot = tracker.geometry(1).unwrap();

        tracker.wm().windows.borrow_mut().remove(&1);
        tracker.handle(Event::ClientListChanged).unwrap();
        tracker.flush().unwrap();

        assert!(tracker.client(1).is_none());
        assert_eq!(tracker.workspace(HOME).unwrap().manager().masters.clients, vec![2]);
        assert_eq!(tracker.geometry(2), Some(master_slot));
    }

    #[test]
    fn last_client_gone_empties_workspace() {
        let mut tracker = make_tracker(RecorderWm::with_windows(1));
        tracker.flush().unwrap();
        tracker.wm().windows.borrow_mut().clear();
        tracker.handle(Event::ClientListChanged).unwrap();
        assert_eq!(tracker.workspace(HOME).unwrap().state(), TilingState::Empty);
    }

    #[test]
    fn failed_move_skips_only_that_client() {
        let wm = RecorderWm::with_windows(3);
        wm.failing.borrow_mut().insert(2);
        let mut tracker = make_tracker(wm);
        tracker.flush().unwrap();

        assert_eq!(tracker.wm().moves.borrow().len(), 2);
        assert!(!tracker.client(2).unwrap().latch.is_locked());
        assert!(tracker.client(3).unwrap().latch.is_locked());
    }

    #[test]
    fn window_sent_to_other_desktop_migrates() {
        let mut tracker = make_tracker(RecorderWm::with_windows(3));
        tracker.flush().unwrap();
        settle(&mut tracker);

        tracker.wm().edit(3, |i| i.location = Location::new(1, 0));
        tracker.handle(Event::WindowConfigured(3)).unwrap();

        let other = Location::new(1, 0);
        assert_eq!(tracker.workspace(HOME).unwrap().clients(), vec![1, 2]);
        assert_eq!(tracker.workspace(other).unwrap().clients(), vec![3]);
        assert_eq!(tracker.workspace(other).unwrap().state(), TilingState::Active);

        tracker.flush().unwrap();
        assert_eq!(tracker.wm().moves_of(3).last(), Some(&Rect::new(5, 5, 1910, 1070)));
    }

    #[test]
    fn desktop_change_by_state_notification_migrates() {
        let mut tracker = make_tracker(RecorderWm::with_windows(3));
        tracker.flush().unwrap();
        settle(&mut tracker);

        let other = Location::new(1, 0);
        tracker.wm().edit(3, |i| i.location = other);
        tracker.handle(Event::WindowStateChanged(3)).unwrap();
        assert_eq!(tracker.workspace(HOME).unwrap().clients(), vec![1, 2]);
        assert_eq!(tracker.workspace(other).unwrap().clients(), vec![3]);

        // Closing it afterwards leaves the home workspace alone.
        tracker.wm().windows.borrow_mut().remove(&3);
        tracker.handle(Event::ClientListChanged).unwrap();
        assert!(tracker.client(3).is_none());
        assert_eq!(tracker.workspace(HOME).unwrap().clients(), vec![1, 2]);
        assert!(tracker.workspace(other).unwrap().clients().is_empty());
        assert_eq!(tracker.workspace(other).unwrap().state(), TilingState::Empty);
    }

    #[test]
    fn removed_desktop_drops_its_workspace() {
        let wm = RecorderWm::with_windows(2);
        wm.edit(2, |i| i.location = Location::new(1, 0));
        let mut tracker = make_tracker(wm);
        tracker.flush().unwrap();
        assert!(tracker.workspace(Location::new(1, 0)).is_some());

        // The window manager folds desktop 1 into desktop 0.
        tracker.wm().edit(2, |i| i.location = HOME);
        tracker.handle(Event::TopologyChanged).unwrap();
        assert!(tracker.workspace(Location::new(1, 0)).is_none());
        assert_eq!(tracker.workspace(HOME).unwrap().clients(), vec![1, 2]);
    }

    #[test]
    fn failed_pass_does_not_stop_the_others() {
        let wm = RecorderWm::with_windows(3);
        wm.edit(3, |i| i.location = Location::new(1, 0));
        wm.flush_fails.set(true);
        let mut tracker = make_tracker(wm);
        tracker.flush().unwrap();

        assert_eq!(tracker.wm().flushes.get(), 2);
        assert_eq!(tracker.wm().moves_of(3), vec![Rect::new(5, 5, 1910, 1070)]);
        assert!(!tracker.wm().moves_of(1).is_empty());
        // One entry per class and desktop.
        assert_eq!(tracker.cache().entries.borrow().len(), 2);
        assert!(!tracker.has_pending());
    }

    #[test]
    fn untile_reapplies_cached_sticky_state() {
        let cache = MemoryCache::default();
        let entry = Info {
            class: "xterm".into(),
            states: vec![STATE_STICKY.into()],
            geometry: Rect::new(100, 100, 400, 300),
            ..Info::default()
        };
        cache.write(&CacheKey::new(&workplace_id(&[SCREEN]), &entry), &entry).unwrap();

        let mut tracker = make_tracker_with(RecorderWm::with_windows(1), cache, Config::default());
        tracker.flush().unwrap();
        assert!(tracker.wm().states.borrow().is_empty());

        tracker.handle(Event::Command(Command::Untile)).unwrap();
        assert_eq!(*tracker.wm().states.borrow(), vec![(1, STATE_STICKY.to_string(), true)]);
        assert!(tracker.client(1).unwrap().latest.is_sticky());
    }

    #[test]
    fn untile_clears_maximized_state() {
        let mut tracker = make_tracker(RecorderWm::with_windows(1));
        tracker.flush().unwrap();
        settle(&mut tracker);

        tracker.wm().edit(1, |i| i.states = vec![STATE_FULLSCREEN.into()]);
        tracker.handle(Event::WindowStateChanged(1)).unwrap();
        tracker.handle(Event::Command(Command::Untile)).unwrap();

        assert_eq!(*tracker.wm().states.borrow(), vec![(1, STATE_FULLSCREEN.to_string(), false)]);
        assert_eq!(tracker.geometry(1), Some(Rect::new(100, 100, 400, 300)));
    }

    #[test]
    fn untiled_workspace_restores_cached_geometry_on_first_sight() {
        let cache = MemoryCache::default();
        let entry = Info {
            class: "xterm".into(),
            geometry: Rect::new(11, 22, 333, 444),
            ..Info::default()
        };
        cache.write(&CacheKey::new(&workplace_id(&[SCREEN]), &entry), &entry).unwrap();
        let config = Config {
            tiling_enabled: false,
            ..Config::default()
        };

        let tracker = make_tracker_with(RecorderWm::with_windows(1), cache, config);
        assert_eq!(tracker.wm().moves_of(1), vec![Rect::new(11, 22, 333, 444)]);
        assert_eq!(tracker.geometry(1), Some(Rect::new(11, 22, 333, 444)));
        assert!(tracker.client(1).unwrap().latch.is_locked());
        assert_eq!(tracker.wm().flushes.get(), 1);
    }

    #[test]
    fn next_window_activates_neighbour() {
        let mut tracker = make_tracker(RecorderWm::with_windows(3));
        tracker.wm().active.set(Some(3));
        tracker.handle(Event::Command(Command::NextWindow)).unwrap();
        assert_eq!(*tracker.wm().activated.borrow(), vec![1]);
    }

    #[test]
    fn command_without_active_window_uses_current_desktop() {
        let mut tracker = make_tracker(RecorderWm::with_windows(2));
        tracker.flush().unwrap();
        tracker.handle(Event::Command(Command::CycleNext)).unwrap();
        assert_eq!(
            tracker.workspace(HOME).unwrap().layout().kind(),
            LayoutKind::Vertical { mirrored: true }
        );
        assert!(tracker.has_pending());
    }

    #[test]
    fn maximized_window_is_unmaximized_before_tiling() {
        let wm = RecorderWm::with_windows(1);
        wm.edit(1, |i| i.states = vec![STATE_MAXIMIZED_VERT.into(), STATE_MAXIMIZED_HORZ.into()]);
        let mut tracker = make_tracker(wm);
        tracker.flush().unwrap();
        let states = tracker.wm().states.borrow();
        assert_eq!(states.len(), 2);
        assert!(states.iter().all(|(w, _, enabled)| *w == 1 && !enabled));
    }

    #[test]
    fn decorations_are_stripped_and_restored() {
        let config = Config {
            window_decoration: false,
            ..Config::default()
        };
        let mut tracker = make_tracker_with(RecorderWm::with_windows(1), MemoryCache::default(), config);
        tracker.flush().unwrap();
        assert_eq!(*tracker.wm().decorations.borrow(), vec![(1, false)]);

        tracker.handle(Event::Command(Command::Untile)).unwrap();
        assert_eq!(*tracker.wm().decorations.borrow(), vec![(1, false), (1, true)]);
    }

    #[test]
    fn topology_change_rebuilds_workspaces() {
        let mut tracker = make_tracker(RecorderWm::with_windows(2));
        tracker.flush().unwrap();
        tracker.handle(Event::TopologyChanged).unwrap();
        assert_eq!(tracker.workspace(HOME).unwrap().clients(), vec![1, 2]);
        assert!(tracker.has_pending());
    }
}
