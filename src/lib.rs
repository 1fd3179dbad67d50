//! **ewtile** — automatic tiling for EWMH-compliant window managers.
//!
//! ewtile runs next to an existing window manager (Xfwm, Openbox, …) and
//! keeps the windows of every desktop/screen pair arranged in a
//! master/slave layout.  Manually dragging a tile boundary is picked up and
//! turned into new layout proportions; turning tiling off puts every window
//! back where it was before.
//!
//! # Architecture
//!
//! The crate is organised around three core traits:
//!
//! * [`traits::WindowManager`] — abstracts window queries and move/state
//!   requests so the tiling logic is not coupled to X11.
//! * [`traits::EventSource`] — abstracts the transports that deliver
//!   window notifications and user commands.
//! * [`traits::CacheStore`] — abstracts where pre-tiling window geometry is
//!   remembered across sessions.
//!
//! [`tracker::Tracker`] ties them together.  Concrete implementations live
//! in [`x11`] (EWMH over `x11rb`), [`ipc`] (Unix-socket command listener)
//! and [`cache`] (JSON files).

pub mod addons;
pub mod cache;
pub mod client;
pub mod command;
pub mod config;
pub mod geometry;
pub mod ipc;
pub mod layout;
pub mod manager;
pub mod proportions;
pub mod tracker;
pub mod traits;
pub mod workspace;
pub mod x11;
