use crate::common::config_files::resolve_config_path;
use crate::store::ASSETS_FILE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// When enabled the application initialises the logger at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file receiving log output instead of stdout.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Saved asset list, relative to the settings directory unless absolute.
    #[serde(default = "default_assets_file")]
    pub assets_file: String,
    /// Enable toast notifications in the UI.
    #[serde(default = "default_toasts")]
    pub enable_toasts: bool,
    /// Duration of toast notifications in seconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration: f32,
    /// Position used to park the main window while it runs in the background.
    #[serde(default = "default_offscreen_pos")]
    pub offscreen_pos: (i32, i32),
    #[serde(default = "default_window_size")]
    pub window_size: (i32, i32),
}

fn default_assets_file() -> String {
    ASSETS_FILE.to_string()
}

fn default_toasts() -> bool {
    true
}

fn default_toast_duration() -> f32 {
    3.0
}

fn default_offscreen_pos() -> (i32, i32) {
    (-10_000, -10_000)
}

fn default_window_size() -> (i32, i32) {
    (400, 300)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_file: None,
            assets_file: default_assets_file(),
            enable_toasts: default_toasts(),
            toast_duration: default_toast_duration(),
            offscreen_pos: default_offscreen_pos(),
            window_size: default_window_size(),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn assets_path(&self, settings_path: &Path) -> PathBuf {
        resolve_config_path(settings_path, &self.assets_file)
    }

    pub fn log_path(&self, settings_path: &Path) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .map(|file| resolve_config_path(settings_path, file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{ "debug_logging": true, "toast_duration": 5.0 }"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert!(settings.debug_logging);
        assert_eq!(settings.toast_duration, 5.0);
        assert_eq!(settings.assets_file, ASSETS_FILE);
        assert!(settings.enable_toasts);
        assert_eq!(settings.assets_path(&path), dir.path().join(ASSETS_FILE));
    }

    #[test]
    fn written_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let settings = Settings {
            log_file: Some("overlay.log".into()),
            enable_toasts: false,
            ..Settings::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.log_path(&path), Some(dir.path().join("overlay.log")));
    }
}
