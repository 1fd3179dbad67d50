//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/ewtile/config.json`.
//! Every field is optional; a missing file or a minimal `{}` falls back to
//! the compiled-in defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "tiling_layout": "vertical-right",
//!   "window_gap_size": 8,
//!   "window_ignore": [["^gimp", ""], ["firefox", "picture-in-picture"]],
//!   "proportion": 0.6
//! }
//! ```

use crate::layout::LayoutKind;
use crate::manager::ManagerSettings;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether new workspaces start out tiling.
    pub tiling_enabled: bool,
    /// Initial layout of every workspace, by name (e.g. `"vertical-left"`).
    pub tiling_layout: String,

    /// Initial number of masters shown side by side.
    pub window_masters_allowed: usize,
    /// Upper bound for `increase-master`.
    pub window_masters_max: usize,
    /// Number of slaves shown side by side; further slaves share their rows.
    pub window_slaves_allowed: usize,
    /// Gap between tiles and around the desktop edge (px).
    pub window_gap_size: i32,
    /// Keep window decorations while tiling.  `false` strips them and
    /// restores them when tiling is turned off.
    pub window_decoration: bool,
    /// `(class, title)` regex pairs of windows never to tile.  An empty
    /// title pattern ignores the whole class.
    pub window_ignore: Vec<(String, String)>,

    /// Initial share of the master area.
    pub proportion: f64,
    /// Change of the master share per `increase-proportion` /
    /// `decrease-proportion`.
    pub proportion_step: f64,
    /// Smallest share any pane can be resized to.
    pub proportion_min: f64,

    /// Remember window geometry across sessions.
    pub cache_windows: bool,
    /// Quiet period after the last event before a placement pass (ms).
    pub debounce_ms: u64,
    /// How long a programmatic move keeps swallowing its own notification
    /// (ms).  `0` waits for the notification however late it comes.
    pub lock_timeout_ms: u64,
    /// Run the scripts in `$XDG_CONFIG_HOME/ewtile/addons` on startup.
    pub addons_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tiling_enabled: true,
            tiling_layout: "vertical-left".into(),
            window_masters_allowed: 1,
            window_masters_max: 4,
            window_slaves_allowed: 3,
            window_gap_size: 5,
            window_decoration: true,
            window_ignore: Vec::new(),
            proportion: 0.5,
            proportion_step: 0.05,
            proportion_min: 0.1,
            cache_windows: true,
            debounce_ms: 100,
            lock_timeout_ms: 1000,
            addons_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// The configured initial layout.  Unknown names fall back to
    /// `vertical-left`.
    pub fn layout(&self) -> LayoutKind {
        self.tiling_layout.parse().unwrap_or_else(|e| {
            warn!("{}, using {}", e, LayoutKind::ALL[0]);
            LayoutKind::ALL[0]
        })
    }

    /// Settings every layout manager is created with.
    pub fn manager_settings(&self) -> ManagerSettings {
        let proportion_min = self.proportion_min.clamp(0.0, 0.5);
        ManagerSettings {
            masters_allowed: self.window_masters_allowed.max(1),
            masters_max: self.window_masters_max.max(1),
            slaves_allowed: self.window_slaves_allowed.max(1),
            proportion: self.proportion.clamp(proportion_min, 1.0 - proportion_min),
            proportion_min,
            proportion_step: self.proportion_step.abs(),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// `None` when notifications are awaited without a deadline.
    pub fn lock_timeout(&self) -> Option<Duration> {
        match self.lock_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "tiling_enabled": false,
            "tiling_layout": "horizontal-bottom",
            "window_masters_allowed": 2,
            "window_masters_max": 3,
            "window_slaves_allowed": 4,
            "window_gap_size": 10,
            "window_decoration": false,
            "window_ignore": [["^gimp", ""], ["firefox", "picture"]],
            "proportion": 0.6,
            "proportion_step": 0.1,
            "proportion_min": 0.2,
            "cache_windows": false,
            "debounce_ms": 50,
            "lock_timeout_ms": 0,
            "addons_enabled": false
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert!(!cfg.tiling_enabled);
        assert_eq!(cfg.layout(), LayoutKind::Horizontal { mirrored: true });
        assert_eq!(cfg.window_gap_size, 10);
        assert!(!cfg.window_decoration);
        assert_eq!(cfg.window_ignore.len(), 2);
        assert_eq!(cfg.window_ignore[1], ("firefox".into(), "picture".into()));
        assert_eq!(cfg.debounce(), Duration::from_millis(50));
        assert_eq!(cfg.lock_timeout(), None);

        let settings = cfg.manager_settings();
        assert_eq!(settings.masters_allowed, 2);
        assert_eq!(settings.masters_max, 3);
        assert_eq!(settings.slaves_allowed, 4);
        assert_eq!(settings.proportion, 0.6);
        assert_eq!(settings.proportion_step, 0.1);
        assert_eq!(settings.proportion_min, 0.2);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        let d = Config::default();
        assert_eq!(cfg.tiling_enabled, d.tiling_enabled);
        assert_eq!(cfg.tiling_layout, d.tiling_layout);
        assert_eq!(cfg.window_gap_size, 5);
        assert_eq!(cfg.lock_timeout(), Some(Duration::from_secs(1)));
        assert_eq!(cfg.manager_settings(), ManagerSettings::default());
    }

    #[test]
    fn deserialize_partial_config() {
        let cfg: Config = serde_json::from_str(r#"{ "window_gap_size": 0 }"#).unwrap();
        assert_eq!(cfg.window_gap_size, 0);
        assert_eq!(cfg.proportion, Config::default().proportion);
    }

    #[test]
    fn unknown_keys_ignored() {
        let json = r#"{ "window_gap_size": 3, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn unknown_layout_falls_back() {
        let cfg = Config {
            tiling_layout: "spiral".into(),
            ..Config::default()
        };
        assert_eq!(cfg.layout(), LayoutKind::Vertical { mirrored: false });
    }

    #[test]
    fn out_of_range_settings_are_clamped() {
        let cfg = Config {
            window_masters_allowed: 0,
            window_slaves_allowed: 0,
            proportion: 1.5,
            proportion_min: 0.9,
            proportion_step: -0.05,
            ..Config::default()
        };
        let s = cfg.manager_settings();
        assert_eq!(s.masters_allowed, 1);
        assert_eq!(s.slaves_allowed, 1);
        assert_eq!(s.proportion_min, 0.5);
        assert_eq!(s.proportion, 0.5);
        assert_eq!(s.proportion_step, 0.05);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/ewtile/config.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
