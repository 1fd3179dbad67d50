//! IPC over a Unix socket.
//!
//! External tools (scripts, key-bind helpers, the `ewtile <command>` client
//! mode, etc.) connect to the socket and send newline-delimited JSON
//! commands.

pub mod listener;
