//! JSON file [`CacheStore`] implementation.
//!
//! Each client snapshot lives in its own file:
//!
//! ```text
//! <root>/workplaces/<workplace>/clients/<class>/<class>-<desktop>.json
//! ```
//!
//! `<root>` defaults to `$XDG_CACHE_HOME/ewtile`.  Path components are
//! sanitised so a window class can never escape its directory.

use crate::client::Info;
use crate::traits::{CacheKey, CacheStore};
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Errors produced by the file cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("json error on {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A [`CacheStore`] writing one JSON file per key.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// `$XDG_CACHE_HOME/ewtile`, falling back to `$HOME/.cache/ewtile`.
    pub fn default_root() -> PathBuf {
        let base = std::env::var("XDG_CACHE_HOME").unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            format!("{}/.cache", home)
        });
        PathBuf::from(base).join("ewtile")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`.
    pub fn path(&self, key: &CacheKey) -> PathBuf {
        let class = sanitize(&key.class);
        self.root
            .join("workplaces")
            .join(sanitize(&key.workplace))
            .join("clients")
            .join(&class)
            .join(format!("{}-{}.json", class, key.desktop))
    }
}

/// Keep `[A-Za-z0-9._+-]`, replace everything else with `_`.  Never returns
/// an empty string, `.` or `..`.
fn sanitize(component: &str) -> String {
    let s: String = component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match s.as_str() {
        "" | "." | ".." => "_".repeat(s.len().max(1)),
        _ => s,
    }
}

impl CacheStore for FileCache {
    type Error = CacheError;

    fn read(&self, key: &CacheKey) -> Result<Option<Info>, CacheError> {
        let path = self.path(key);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        let info = serde_json::from_str(&contents).map_err(|source| CacheError::Json {
            path: path.clone(),
            source,
        })?;
        debug!("cache hit {}", path.display());
        Ok(Some(info))
    }

    fn write(&self, key: &CacheKey, info: &Info) -> Result<(), CacheError> {
        let path = self.path(key);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| CacheError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(info).map_err(|source| CacheError::Json {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("cache write {}", path.display());
        Ok(())
    }
}

//  Tests
