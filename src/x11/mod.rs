//! X11 implementations.
//!
//! This module provides concrete backends for the
//! [`WindowManager`](crate::traits::WindowManager) and
//! [`EventSource`](crate::traits::EventSource) traits, talking EWMH to a
//! running window manager through `x11rb`.
//!
//! Nothing outside this module should reference X11 directly.

pub mod events;
pub mod wm;

use x11rb::atom_manager;

atom_manager! {
    /// Atoms interned once per connection.
    pub Atoms:

    /// A handle to the pending intern requests.
    AtomsCookie {
        UTF8_STRING,
        WM_CLASS,
        WM_NAME,
        _NET_CLIENT_LIST,
        _NET_ACTIVE_WINDOW,
        _NET_CURRENT_DESKTOP,
        _NET_NUMBER_OF_DESKTOPS,
        _NET_WORKAREA,
        _NET_WM_NAME,
        _NET_WM_DESKTOP,
        _NET_WM_STATE,
        _NET_WM_WINDOW_TYPE,
        _NET_FRAME_EXTENTS,
        _GTK_FRAME_EXTENTS,
        _NET_MOVERESIZE_WINDOW,
        _MOTIF_WM_HINTS,
    }
}
