//! Unix-socket [`EventSource`] implementation.
//!
//! Binds a Unix stream socket and serves one connection at a time.  Every
//! line received is decoded into a [`Command`] and forwarded as
//! [`Event::Command`].
//!
//! # Wire format
//!
//! One command per line, either as a JSON string or as a bare name (any
//! spelling [`parse_command`] accepts):
//!
//! ```text
//! "Tile"
//! "cycle-next"
//! make-master
//! ```

use crate::command::{parse_command, Command, Event};
use crate::traits::EventSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// An [`EventSource`] serving commands on a Unix stream socket.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
}

/// Decode one line.  Blank lines carry no command.
fn parse_line(line: &str) -> Result<Option<Command>, UnixSocketError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.starts_with('"') {
        return Ok(Some(serde_json::from_str(line)?));
    }
    match parse_command(line) {
        Some(cmd) => Ok(Some(cmd)),
        None => Err(UnixSocketError::UnknownCommand(line.to_string())),
    }
}

/// Forward every command sent over `stream`.  Returns `false` once the
/// sink is gone.
fn serve(stream: UnixStream, sink: &mpsc::Sender<Event>) -> bool {
    for line in BufReader::new(stream).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("read error: {}", e);
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some(cmd)) => {
                debug!("received {}", cmd);
                if sink.send(Event::Command(cmd)).is_err() {
                    return false;
                }
            }
            Ok(None) => {}
            Err(e) => error!("bad command line {:?}: {}", line, e),
        }
    }
    true
}

impl UnixSocketListener {
    /// The socket file is created by [`run`](EventSource::run); a stale
    /// one is replaced.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl EventSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Blocks until the sink is dropped.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        let _ = std::fs::remove_file(&self.path);
        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if !serve(stream, &sink) {
                        info!("sink closed, shutting down");
                        break;
                    }
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
        let _ = std::fs::remove_file(&self.path);
        Ok(())
    }
}

/// Send a single command to a running listener at `path`.
pub fn send_command(path: impl AsRef<Path>, cmd: Command) -> Result<(), UnixSocketError> {
    let mut stream = UnixStream::connect(path)?;
    writeln!(stream, "{}", serde_json::to_string(&cmd)?)?;
    Ok(())
}

//  Tests
