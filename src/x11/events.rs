//! X11 [`EventSource`] implementation.
//!
//! Blocks on the shared connection and translates the property, configure
//! and RandR notifications selected by [`EwmhWm`](super::wm::EwmhWm) into
//! [`Event`]s.

use super::wm::EwmhError;
use super::Atoms;
use crate::command::Event;
use crate::traits::EventSource;
use log::{debug, info};
use std::sync::mpsc;
use std::sync::Arc;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, Window};
use x11rb::protocol::Event as XEvent;
use x11rb::rust_connection::RustConnection;

/// The property atoms whose changes are forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watched {
    pub client_list: Atom,
    pub active_window: Atom,
    pub current_desktop: Atom,
    pub number_of_desktops: Atom,
    pub workarea: Atom,
    pub wm_state: Atom,
    pub wm_desktop: Atom,
    pub wm_window_type: Atom,
    pub frame_extents: Atom,
}

impl From<&Atoms> for Watched {
    fn from(atoms: &Atoms) -> Self {
        Self {
            client_list: atoms._NET_CLIENT_LIST,
            active_window: atoms._NET_ACTIVE_WINDOW,
            current_desktop: atoms._NET_CURRENT_DESKTOP,
            number_of_desktops: atoms._NET_NUMBER_OF_DESKTOPS,
            workarea: atoms._NET_WORKAREA,
            wm_state: atoms._NET_WM_STATE,
            wm_desktop: atoms._NET_WM_DESKTOP,
            wm_window_type: atoms._NET_WM_WINDOW_TYPE,
            frame_extents: atoms._NET_FRAME_EXTENTS,
        }
    }
}

impl Watched {
    fn root_property(&self, atom: Atom) -> Option<Event> {
        if atom == self.client_list {
            Some(Event::ClientListChanged)
        } else if atom == self.active_window {
            Some(Event::ActiveWindowChanged)
        } else if atom == self.current_desktop {
            Some(Event::DesktopChanged)
        } else if atom == self.workarea || atom == self.number_of_desktops {
            Some(Event::TopologyChanged)
        } else {
            None
        }
    }

    fn window_property(&self, window: Window, atom: Atom) -> Option<Event> {
        if atom == self.wm_state || atom == self.wm_desktop || atom == self.wm_window_type {
            Some(Event::WindowStateChanged(window))
        } else if atom == self.frame_extents {
            Some(Event::WindowConfigured(window))
        } else {
            None
        }
    }
}

/// Map one X event to the tracker's vocabulary.
pub fn translate(event: &XEvent, watched: &Watched, root: Window) -> Option<Event> {
    match event {
        XEvent::PropertyNotify(e) if e.window == root => watched.root_property(e.atom),
        XEvent::PropertyNotify(e) => watched.window_property(e.window, e.atom),
        XEvent::ConfigureNotify(e) if e.window == root => Some(Event::TopologyChanged),
        XEvent::ConfigureNotify(e) => Some(Event::WindowConfigured(e.window)),
        XEvent::RandrScreenChangeNotify(_) | XEvent::RandrNotify(_) => Some(Event::TopologyChanged),
        _ => None,
    }
}

/// An [`EventSource`] reading the X server's event queue.
pub struct X11EventSource {
    conn: Arc<RustConnection>,
    watched: Watched,
    root: Window,
}

impl X11EventSource {
    pub fn new(conn: Arc<RustConnection>, watched: Watched, root: Window) -> Self {
        Self {
            conn,
            watched,
            root,
        }
    }
}

impl EventSource for X11EventSource {
    type Error = EwmhError;

    /// Blocks until the connection breaks or the sink is dropped.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        loop {
            let event = self.conn.wait_for_event()?;
            if let Some(event) = translate(&event, &self.watched, self.root) {
                debug!("x11 {:?}", event);
                if sink.send(event).is_err() {
                    info!("sink closed, shutting down");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x11rb::protocol::xproto::{
        ConfigureNotifyEvent, Property, PropertyNotifyEvent, CONFIGURE_NOTIFY_EVENT,
        PROPERTY_NOTIFY_EVENT,
    };

    const ROOT: Window = 0x100;

    fn watched() -> Watched {
        Watched {
            client_list: 1,
            active_window: 2,
            current_desktop: 3,
            number_of_desktops: 4,
            workarea: 5,
            wm_state: 6,
            wm_desktop: 7,
            wm_window_type: 8,
            frame_extents: 9,
        }
    }

    fn property(window: Window, atom: Atom) -> XEvent {
        XEvent::PropertyNotify(PropertyNotifyEvent {
            response_type: PROPERTY_NOTIFY_EVENT,
            sequence: 0,
            window,
            atom,
            time: 0,
            state: Property::NEW_VALUE,
        })
    }

    fn configure(window: Window) -> XEvent {
        XEvent::ConfigureNotify(ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: 0,
            x: 10,
            y: 20,
            width: 300,
            height: 200,
            border_width: 0,
            override_redirect: false,
        })
    }

    #[test]
    fn root_properties() {
        let w = watched();
        assert_eq!(translate(&property(ROOT, 1), &w, ROOT), Some(Event::ClientListChanged));
        assert_eq!(translate(&property(ROOT, 2), &w, ROOT), Some(Event::ActiveWindowChanged));
        assert_eq!(translate(&property(ROOT, 3), &w, ROOT), Some(Event::DesktopChanged));
        // Desktops added or removed: workspaces must be rebuilt.
        assert_eq!(translate(&property(ROOT, 4), &w, ROOT), Some(Event::TopologyChanged));
        assert_eq!(translate(&property(ROOT, 5), &w, ROOT), Some(Event::TopologyChanged));
        assert_eq!(translate(&property(ROOT, 6), &w, ROOT), None);
        assert_eq!(translate(&property(ROOT, 42), &w, ROOT), None);
    }

    #[test]
    fn window_properties() {
        let w = watched();
        assert_eq!(translate(&property(7, 6), &w, ROOT), Some(Event::WindowStateChanged(7)));
        assert_eq!(translate(&property(7, 7), &w, ROOT), Some(Event::WindowStateChanged(7)));
        assert_eq!(translate(&property(7, 8), &w, ROOT), Some(Event::WindowStateChanged(7)));
        assert_eq!(translate(&property(7, 9), &w, ROOT), Some(Event::WindowConfigured(7)));
        // Root-only atoms on a client window are ignored.
        assert_eq!(translate(&property(7, 1), &w, ROOT), None);
    }

    #[test]
    fn configure_notifications() {
        let w = watched();
        assert_eq!(translate(&configure(7), &w, ROOT), Some(Event::WindowConfigured(7)));
        assert_eq!(translate(&configure(ROOT), &w, ROOT), Some(Event::TopologyChanged));
    }
}
