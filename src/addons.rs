//! Startup addon scripts.
//!
//! Every file in `$XDG_CONFIG_HOME/ewtile/addons` is started once when the
//! daemon comes up, typically to send commands over the socket.  Each child
//! is reaped on its own thread so it never lingers as a zombie.

use log::{debug, info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Files in `dir`, sorted by path.  A missing directory has no addons.
pub fn scripts(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

fn spawn(path: &Path) -> std::io::Result<Child> {
    Command::new(path)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
}

/// Start every addon in `dir`.  Returns how many were started.
pub fn run(dir: &Path) -> usize {
    let files = match scripts(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("cannot read addons in {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut started = 0;
    for path in files {
        info!("execute addon {}", path.display());
        match spawn(&path) {
            Ok(mut child) => {
                started += 1;
                std::thread::spawn(move || match child.wait() {
                    Ok(status) => debug!("addon {} exited with {}", path.display(), status),
                    Err(e) => warn!("addon {}: {}", path.display(), e),
                });
            }
            Err(e) => warn!("cannot execute addon {}: {}", path.display(), e),
        }
    }
    started
}
