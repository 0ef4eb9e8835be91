//! Application configuration.
//!
//! Loads settings from death_counter_config.json next to the executable.
//! Missing keys fall back to their defaults individually, so old config
//! files keep working after new settings are added.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Saved window placement for the GUI.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Complete application configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the monitor to capture. Empty = primary monitor.
    #[serde(default)]
    pub selected_screen_name: String,
    /// Width of the capture zone in pixels
    #[serde(default = "default_capture_width")]
    pub capture_width: u32,
    /// Height of the capture zone in pixels
    #[serde(default = "default_capture_height")]
    pub capture_height: u32,
    /// Seconds between scans
    #[serde(default = "default_scan_delay")]
    pub scan_delay: f64,
    /// Log every recognized text candidate
    #[serde(default)]
    pub verbose_mode: bool,
    /// Save a screenshot whenever a death is detected
    #[serde(default)]
    pub debug_mode: bool,
    /// Minimum OCR confidence (0.0-1.0) for a candidate to be considered
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// Similarity ratio (0.0-1.0) above which a candidate matches a death message
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    /// GUI window placement, saved on exit
    #[serde(default)]
    pub window_geometry: Option<WindowGeometry>,
}

fn default_capture_width() -> u32 {
    1500
}

fn default_capture_height() -> u32 {
    250
}

fn default_scan_delay() -> f64 {
    1.0
}

fn default_min_confidence() -> f32 {
    0.4
}

fn default_match_threshold() -> f64 {
    0.85
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            selected_screen_name: String::new(),
            capture_width: default_capture_width(),
            capture_height: default_capture_height(),
            scan_delay: default_scan_delay(),
            verbose_mode: false,
            debug_mode: false,
            min_confidence: default_min_confidence(),
            match_threshold: default_match_threshold(),
            window_geometry: None,
        }
    }
}

/// Loads configuration from the given path, falling back to defaults.
///
/// A missing file is normal on first launch. Read and parse failures are
/// logged and never propagated; the monitor must be able to start with a
/// broken config file on disk.
pub fn load_config(path: &Path) -> AppConfig {
    if !path.exists() {
        crate::log(&format!(
            "{} not found. Using default config.",
            path.display()
        ));
        return AppConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                crate::log(&format!("Config loaded from {}", path.display()));
                config
            }
            Err(e) => {
                crate::log(&format!("Failed to parse config: {}. Using defaults.", e));
                AppConfig::default()
            }
        },
        Err(e) => {
            crate::log(&format!("Failed to read config: {}. Using defaults.", e));
            AppConfig::default()
        }
    }
}

/// Saves configuration as pretty-printed JSON.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("nope.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = AppConfig {
            selected_screen_name: "DP-1".to_string(),
            capture_width: 1200,
            capture_height: 300,
            scan_delay: 0.5,
            verbose_mode: true,
            debug_mode: true,
            min_confidence: 0.5,
            match_threshold: 0.9,
            window_geometry: Some(WindowGeometry {
                x: 10.0,
                y: 20.0,
                width: 800.0,
                height: 600.0,
            }),
        };

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn test_missing_keys_fall_back_individually() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"capture_width": 1000, "verbose_mode": true}"#).unwrap();

        let config = load_config(&path);
        assert_eq!(config.capture_width, 1000);
        assert!(config.verbose_mode);
        // Everything else keeps its default
        assert_eq!(config.capture_height, 250);
        assert_eq!(config.scan_delay, 1.0);
        assert_eq!(config.match_threshold, 0.85);
        assert!(config.window_geometry.is_none());
    }

    #[test]
    fn test_corrupt_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
    }
}
