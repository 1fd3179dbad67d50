//! [`WindowManager`] implementation speaking EWMH over an X11 connection.
//!
//! Queries read the standard root and client properties
//! (`_NET_CLIENT_LIST`, `_NET_WM_STATE`, `_NET_FRAME_EXTENTS`, …); requests
//! are sent as client messages to the root window so the running window
//! manager carries them out.  Screens come from RandR monitors, falling
//! back to the root window when the extension is missing.

use super::events::X11EventSource;
use super::Atoms;
use crate::client::{Extents, Info, Location, WindowId, STATE_STICKY};
use crate::geometry::Rect;
use crate::traits::WindowManager;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeWindowAttributesAux, ClientMessageData, ClientMessageEvent,
    ConnectionExt as _, EventMask, KeyButMask, PropMode, Window, CLIENT_MESSAGE_EVENT,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

/// `_NET_WM_DESKTOP` value of windows shown on every desktop.
const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

/// `_MOTIF_WM_HINTS` flag marking the decorations field as valid.
const MWM_HINTS_DECORATIONS: u32 = 1 << 1;

/// `_NET_MOVERESIZE_WINDOW` flags: static gravity, x/y/width/height present,
/// request issued by a pager.
const MOVERESIZE_FLAGS: u32 = 10 | (0xF << 8) | (2 << 12);

/// Source indication for requests sent on behalf of a pager.
const SOURCE_PAGER: u32 = 2;

/// Longest property read, in 32-bit units.
const MAX_PROPERTY_LEN: u32 = 1024;

/// Errors that can occur when talking to the X server.
#[derive(Debug, thiserror::Error)]
pub enum EwmhError {
    #[error("cannot connect to X server: {0}")]
    Connect(#[from] ConnectError),
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("bad reply: {0}")]
    Reply(#[from] ReplyError),
    #[error("display has no screen {0}")]
    NoScreen(usize),
}

/// EWMH-backed window manager.
pub struct EwmhWm {
    conn: Arc<RustConnection>,
    atoms: Atoms,
    root: Window,
    /// Root window size, used when RandR is unavailable.
    root_size: Rect,
    randr: bool,
    names: RefCell<HashMap<Atom, String>>,
}

impl EwmhWm {
    /// Connect to `$DISPLAY` and subscribe to root window changes.
    pub fn connect() -> Result<Self, EwmhError> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or(EwmhError::NoScreen(screen_num))?;
        let root = screen.root;
        let root_size = Rect::new(
            0,
            0,
            screen.width_in_pixels.into(),
            screen.height_in_pixels.into(),
        );

        let atoms = Atoms::new(&conn)?.reply()?;
        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY),
        )?;

        let randr = match conn.randr_query_version(1, 5) {
            Ok(cookie) => cookie
                .reply()
                .map(|v| (v.major_version, v.minor_version) >= (1, 5))
                .unwrap_or(false),
            Err(_) => false,
        };
        if randr {
            conn.randr_select_input(
                root,
                randr::NotifyMask::SCREEN_CHANGE
                    | randr::NotifyMask::CRTC_CHANGE
                    | randr::NotifyMask::OUTPUT_CHANGE,
            )?;
        } else {
            warn!("RandR 1.5 not available, treating the root window as one screen");
        }
        conn.flush()?;
        info!("connected to X server, root window 0x{:x}", root);

        Ok(Self {
            conn: Arc::new(conn),
            atoms,
            root,
            root_size,
            randr,
            names: RefCell::new(HashMap::new()),
        })
    }

    /// An event source sharing this connection.
    pub fn events(&self) -> X11EventSource {
        X11EventSource::new(Arc::clone(&self.conn), (&self.atoms).into(), self.root)
    }

    //  Property helpers

    fn property32(
        &self,
        window: Window,
        property: Atom,
        type_: impl Into<Atom>,
    ) -> Result<Vec<u32>, EwmhError> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, MAX_PROPERTY_LEN)?
            .reply()?;
        Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
    }

    fn cardinal(&self, window: Window, property: Atom) -> Result<Option<u32>, EwmhError> {
        Ok(self
            .property32(window, property, AtomEnum::CARDINAL)?
            .first()
            .copied())
    }

    fn text(&self, window: Window, property: impl Into<Atom>) -> Result<Option<String>, EwmhError> {
        let reply = self
            .conn
            .get_property(false, window, property, AtomEnum::ANY, 0, MAX_PROPERTY_LEN)?
            .reply()?;
        if reply.value.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()))
    }

    fn atom_name(&self, atom: Atom) -> Result<String, EwmhError> {
        if let Some(name) = self.names.borrow().get(&atom) {
            return Ok(name.clone());
        }
        let reply = self.conn.get_atom_name(atom)?.reply()?;
        let name = String::from_utf8_lossy(&reply.name).into_owned();
        self.names.borrow_mut().insert(atom, name.clone());
        Ok(name)
    }

    fn atom_names(&self, window: Window, property: Atom) -> Result<Vec<String>, EwmhError> {
        self.property32(window, property, AtomEnum::ATOM)?
            .into_iter()
            .map(|atom| self.atom_name(atom))
            .collect()
    }

    fn client_message(&self, window: Window, type_: Atom, data: [u32; 5]) -> Result<(), EwmhError> {
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window,
            type_,
            data: ClientMessageData::from(data),
        };
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        Ok(())
    }

    fn extents(&self, window: Window) -> Result<Extents, EwmhError> {
        let net = self.property32(window, self.atoms._NET_FRAME_EXTENTS, AtomEnum::CARDINAL)?;
        let gtk = self.property32(window, self.atoms._GTK_FRAME_EXTENTS, AtomEnum::CARDINAL)?;
        Ok(frame_extents(&net, &gtk))
    }

    /// Outer geometry in root coordinates.
    fn outer_geometry(&self, window: Window, extents: &Extents) -> Result<Rect, EwmhError> {
        let geo = self.conn.get_geometry(window)?.reply()?;
        let pos = self
            .conn
            .translate_coordinates(window, self.root, 0, 0)?
            .reply()?;
        let inner = Rect::new(
            pos.dst_x.into(),
            pos.dst_y.into(),
            geo.width.into(),
            geo.height.into(),
        );
        Ok(outer_geometry(inner, extents))
    }
}

impl WindowManager for EwmhWm {
    type Error = EwmhError;

    fn client_list(&self) -> Result<Vec<WindowId>, EwmhError> {
        self.property32(self.root, self.atoms._NET_CLIENT_LIST, AtomEnum::WINDOW)
    }

    fn window_info(&self, window: WindowId) -> Result<Info, EwmhError> {
        let extents = self.extents(window)?;
        let geometry = self.outer_geometry(window, &extents)?;

        let class = self
            .text(window, self.atoms.WM_CLASS)?
            .map(|raw| wm_class(raw.as_bytes()))
            .unwrap_or_default();
        let title = match self.text(window, self.atoms._NET_WM_NAME)? {
            Some(title) => title,
            None => self.text(window, self.atoms.WM_NAME)?.unwrap_or_else(|| class.clone()),
        };

        let mut states = self.atom_names(window, self.atoms._NET_WM_STATE)?;
        let desktop = match self.cardinal(window, self.atoms._NET_WM_DESKTOP)? {
            Some(ALL_DESKTOPS) | None => {
                if !states.iter().any(|s| s == STATE_STICKY) {
                    states.push(STATE_STICKY.to_string());
                }
                self.current_desktop()?
            }
            Some(desktop) => desktop,
        };
        let screens = self.screens()?;
        let motif = self.property32(window, self.atoms._MOTIF_WM_HINTS, AtomEnum::ANY)?;

        Ok(Info {
            class,
            title,
            types: self.atom_names(window, self.atoms._NET_WM_WINDOW_TYPE)?,
            states,
            location: Location::new(desktop, screen_of(&screens, &geometry)),
            geometry,
            extents,
            decorated: decorated(&motif),
        })
    }

    fn move_resize(&self, window: WindowId, geometry: Rect) -> Result<(), EwmhError> {
        let inner = inner_geometry(geometry, &self.extents(window)?);
        debug!("move 0x{:x} to {:?}", window, inner);
        self.client_message(
            window,
            self.atoms._NET_MOVERESIZE_WINDOW,
            [
                MOVERESIZE_FLAGS,
                inner.x as u32,
                inner.y as u32,
                inner.w as u32,
                inner.h as u32,
            ],
        )
    }

    fn set_state(&self, window: WindowId, state: &str, enabled: bool) -> Result<(), EwmhError> {
        let atom = self.conn.intern_atom(false, state.as_bytes())?.reply()?.atom;
        self.client_message(
            window,
            self.atoms._NET_WM_STATE,
            [u32::from(enabled), atom, 0, SOURCE_PAGER, 0],
        )
    }

    fn set_decorated(&self, window: WindowId, decorated: bool) -> Result<(), EwmhError> {
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms._MOTIF_WM_HINTS,
            self.atoms._MOTIF_WM_HINTS,
            &[MWM_HINTS_DECORATIONS, 0, u32::from(decorated), 0, 0],
        )?;
        Ok(())
    }

    fn activate(&self, window: WindowId) -> Result<(), EwmhError> {
        self.client_message(
            window,
            self.atoms._NET_ACTIVE_WINDOW,
            [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
        )
    }

    fn watch(&self, window: WindowId) -> Result<(), EwmhError> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY),
        )?;
        Ok(())
    }

    fn active_window(&self) -> Result<Option<WindowId>, EwmhError> {
        Ok(self
            .property32(self.root, self.atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW)?
            .first()
            .copied()
            .filter(|&w| w != x11rb::NONE))
    }

    fn current_desktop(&self) -> Result<u32, EwmhError> {
        Ok(self
            .cardinal(self.root, self.atoms._NET_CURRENT_DESKTOP)?
            .unwrap_or(0))
    }

    fn pointer_pressed(&self) -> Result<bool, EwmhError> {
        let reply = self.conn.query_pointer(self.root)?.reply()?;
        let buttons = KeyButMask::BUTTON1 | KeyButMask::BUTTON2 | KeyButMask::BUTTON3;
        Ok(u16::from(reply.mask) & u16::from(buttons) != 0)
    }

    fn screens(&self) -> Result<Vec<Rect>, EwmhError> {
        if self.randr {
            let monitors = self.conn.randr_get_monitors(self.root, true)?.reply()?.monitors;
            if !monitors.is_empty() {
                return Ok(monitors
                    .iter()
                    .map(|m| Rect::new(m.x.into(), m.y.into(), m.width.into(), m.height.into()))
                    .collect());
            }
        }
        Ok(vec![self.root_size])
    }

    fn desktop_dimensions(&self, screen: u32) -> Result<Rect, EwmhError> {
        let screens = self.screens()?;
        let bounds = screens
            .get(screen as usize)
            .copied()
            .unwrap_or(self.root_size);
        let workarea = self.property32(self.root, self.atoms._NET_WORKAREA, AtomEnum::CARDINAL)?;
        let desktop = self.current_desktop()?;
        Ok(workarea_for(&workarea, desktop)
            .and_then(|area| area.intersect(&bounds))
            .unwrap_or(bounds))
    }

    fn flush(&self) -> Result<(), EwmhError> {
        self.conn.flush()?;
        Ok(())
    }
}

//  Pure helpers

/// Server-side frame minus client-side shadow, as the window manager sees it.
fn frame_extents(net: &[u32], gtk: &[u32]) -> Extents {
    let get = |values: &[u32], i: usize| values.get(i).map_or(0, |&v| v as i32);
    Extents {
        left: get(net, 0) - get(gtk, 0),
        right: get(net, 1) - get(gtk, 1),
        top: get(net, 2) - get(gtk, 2),
        bottom: get(net, 3) - get(gtk, 3),
    }
}

fn outer_geometry(inner: Rect, ext: &Extents) -> Rect {
    Rect::new(
        inner.x - ext.left,
        inner.y - ext.top,
        inner.w + ext.left + ext.right,
        inner.h + ext.top + ext.bottom,
    )
}

fn inner_geometry(outer: Rect, ext: &Extents) -> Rect {
    Rect::new(
        outer.x + ext.left,
        outer.y + ext.top,
        (outer.w - ext.left - ext.right).max(1),
        (outer.h - ext.top - ext.bottom).max(1),
    )
}

/// Index of the screen holding the centre of `geometry`, `0` if none does.
fn screen_of(screens: &[Rect], geometry: &Rect) -> u32 {
    let (x, y) = geometry.center();
    screens
        .iter()
        .position(|s| s.contains_point(x, y))
        .unwrap_or(0) as u32
}

/// The class part of `WM_CLASS` (`instance\0class\0`).
fn wm_class(raw: &[u8]) -> String {
    let mut parts = raw
        .split(|&b| b == 0)
        .filter(|p| !p.is_empty())
        .map(|p| String::from_utf8_lossy(p).into_owned());
    let instance = parts.next().unwrap_or_default();
    parts.next().unwrap_or(instance)
}

/// Decorations are on unless the Motif hints explicitly turn them off.
fn decorated(motif: &[u32]) -> bool {
    match motif {
        [flags, _, decorations, ..] if flags & MWM_HINTS_DECORATIONS != 0 => *decorations != 0,
        _ => true,
    }
}

/// Entry of `desktop` in `_NET_WORKAREA`, falling back to the first one.
fn workarea_for(workarea: &[u32], desktop: u32) -> Option<Rect> {
    let rects: Vec<Rect> = workarea
        .chunks_exact(4)
        .map(|c| Rect::new(c[0] as i32, c[1] as i32, c[2] as i32, c[3] as i32))
        .collect();
    rects
        .get(desktop as usize)
        .or_else(|| rects.first())
        .copied()
}
