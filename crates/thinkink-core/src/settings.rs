//! Tunable parameters, loadable from a JSON file.
//!
//! Every field has a default, so a settings file only needs the keys it
//! wants to change.

use crate::element::ElementStyle;
use crate::fade::{DEFAULT_FADE_DELAY_MS, DEFAULT_FADE_DURATION_MS};
use crate::geometry::DEFAULT_HIT_TOLERANCE;
use crate::history::MAX_UNDO_HISTORY;
use crate::selection::MIN_RESIZE_EXTENT;
use crate::storage::DEFAULT_AUTOSAVE_INTERVAL_SECS;
use crate::store::DEFAULT_PASTE_OFFSET;
use crate::tools::DEFAULT_COMMIT_THRESHOLD;
use crate::viewport::{MAX_ZOOM, MIN_ZOOM};
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default number of decoded images kept by the renderer.
pub const DEFAULT_IMAGE_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub history_depth: usize,
    pub paste_offset: Vec2,
    /// Hit-test padding in canvas units.
    pub hit_tolerance: f64,
    pub commit_threshold: f64,
    pub min_resize_extent: f64,
    pub fade_delay_ms: u64,
    pub fade_duration_ms: u64,
    pub autosave_interval_secs: u64,
    pub image_cache_capacity: usize,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Style applied to newly drawn elements.
    pub default_style: ElementStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_depth: MAX_UNDO_HISTORY,
            paste_offset: DEFAULT_PASTE_OFFSET,
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            commit_threshold: DEFAULT_COMMIT_THRESHOLD,
            min_resize_extent: MIN_RESIZE_EXTENT,
            fade_delay_ms: DEFAULT_FADE_DELAY_MS,
            fade_duration_ms: DEFAULT_FADE_DURATION_MS,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            image_cache_capacity: DEFAULT_IMAGE_CACHE_CAPACITY,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            default_style: ElementStyle::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from a file.
    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Read settings from a file, falling back to defaults on any error.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_json(r#"{"history_depth": 10, "fade_delay_ms": 500}"#).unwrap();
        assert_eq!(settings.history_depth, 10);
        assert_eq!(settings.fade_delay_ms, 500);
        assert_eq!(settings.fade_duration_ms, DEFAULT_FADE_DURATION_MS);
        assert_eq!(settings.paste_offset, DEFAULT_PASTE_OFFSET);
    }

    #[test]
    fn test_load_missing_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("missing.json"));
        assert_eq!(settings.history_depth, MAX_UNDO_HISTORY);
    }

    #[test]
    fn test_load_malformed_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(Settings::try_load(&path), Err(SettingsError::Parse(_))));
        assert_eq!(Settings::load(&path).image_cache_capacity, DEFAULT_IMAGE_CACHE_CAPACITY);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            hit_tolerance: 8.0,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
    }
}
