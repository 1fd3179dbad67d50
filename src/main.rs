//! Entry point for the **ewtile** daemon.
//!
//! Connects to the X server, spawns the X11 and Unix-socket
//! [`EventSource`](ewtile::traits::EventSource)s on background threads and
//! feeds their events into the [`Tracker`] on the main thread.  Placement
//! passes run once no event arrived for `debounce_ms`.
//!
//! Invoked with a command name (`ewtile cycle-next`), the binary instead
//! sends that command to the running daemon and exits.

use ewtile::addons;
use ewtile::cache::FileCache;
use ewtile::command::{parse_command, Event};
use ewtile::config::Config;
use ewtile::ipc::listener::{send_command, UnixSocketListener};
use ewtile::tracker::Tracker;
use ewtile::traits::{CacheStore, EventSource, WindowManager};
use ewtile::x11::wm::EwmhWm;
use log::{error, info};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

/// Default socket path for the command listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/ewtile.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/ewtile`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("ewtile")
}

/// Try to load the config from `$XDG_CONFIG_HOME/ewtile/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    match std::env::args().nth(1) {
        Some(arg) => run_client(&arg),
        None => run_daemon(),
    }
}

/// Client mode: forward one command to the daemon.
fn run_client(arg: &str) {
    let Some(cmd) = parse_command(arg) else {
        error!("unknown command: {}", arg);
        std::process::exit(1);
    };
    if let Err(e) = send_command(default_socket_path(), cmd) {
        error!("cannot send {}: {}", cmd, e);
        std::process::exit(1);
    }
}

/// Normal daemon mode.
fn run_daemon() {
    let config = load_config();

    let wm = match EwmhWm::connect() {
        Ok(wm) => wm,
        Err(e) => {
            error!("failed to connect to the X server: {}", e);
            std::process::exit(1);
        }
    };
    let x11_events = wm.events();

    let cache = FileCache::new(FileCache::default_root());
    info!("caching windows in {}", cache.root().display());

    let mut tracker = Tracker::new(wm, cache, &config);
    if let Err(e) = tracker.start() {
        error!("failed to read initial state: {}", e);
        std::process::exit(1);
    }

    let (tx, rx) = mpsc::channel::<Event>();
    spawn_event_sources(tx, x11_events);

    if config.addons_enabled {
        addons::run(&config_dir().join("addons"));
    }

    run_event_loop(tracker, rx, config.debounce());
}

//  Event loop

/// Handle events until every source has hung up.  Pending passes are
/// flushed once the channel stays quiet for `debounce`.
fn run_event_loop<W: WindowManager, C: CacheStore>(
    mut tracker: Tracker<W, C>,
    rx: mpsc::Receiver<Event>,
    debounce: Duration,
) {
    info!("ewtile running");
    loop {
        let event = if tracker.has_pending() {
            match rx.recv_timeout(debounce) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(e) = tracker.flush() {
                        error!("placement error: {}", e);
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(event) => event,
                Err(_) => break,
            }
        };
        if let Err(e) = tracker.handle(event) {
            error!("event error: {}", e);
        }
    }
    info!("all event sources closed, exiting");
}

//  Helpers

fn spawn_event_sources<S>(tx: mpsc::Sender<Event>, mut x11_events: S)
where
    S: EventSource + 'static,
{
    {
        let tx = tx.clone();
        std::thread::spawn(move || {
            if let Err(e) = x11_events.run(tx) {
                error!("x11 event source error: {}", e);
            }
        });
    }
    {
        let tx = tx.clone();
        let path = default_socket_path();
        std::thread::spawn(move || {
            let mut source = UnixSocketListener::new(&path);
            if let Err(e) = source.run(tx) {
                error!("socket listener error: {}", e);
            }
        });
    }

    drop(tx);
}
