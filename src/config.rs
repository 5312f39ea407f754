//! Gesture settings
//!
//! Stored next to the other Flick state files, `~/.local/state/flick/gestures.toml`.
//! JSON is accepted too when the file name ends in `.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::input::Side;

/// Tunables for [`EdgeDragRecognizer`](crate::input::EdgeDragRecognizer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDragConfig {
    /// Screen edge the recognizer listens on
    pub side: Side,
    /// Width of the band along the edge where a touch has to begin (px)
    pub edge_threshold: f64,
    /// How far past the monitor edge the touch has to travel to complete (px)
    pub drag_distance: f64,
    /// Displacement along the drag axis that cancels the gesture (px)
    pub cancel_threshold: f64,
    /// A touch still inside the edge band after this long is cancelled (ms)
    pub cancel_timeout_ms: u64,
}

impl Default for EdgeDragConfig {
    fn default() -> Self {
        Self {
            side: Side::Top,
            edge_threshold: 20.0,
            drag_distance: 80.0,
            cancel_threshold: 100.0,
            cancel_timeout_ms: 200,
        }
    }
}

/// Defaults for new [`DragStartRecognizer`](crate::input::DragStartRecognizer)s
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragStartConfig {
    /// Only an explicit `start_drag` call completes the gesture
    pub manual_mode: bool,
    /// Touch drags need to be held this long before moving (ms)
    pub timeout_threshold_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// Distance a pointer has to move before a drag starts, in unscaled pixels
    pub drag_threshold: i32,
    pub drag_start: DragStartConfig,
    pub edge_drag: EdgeDragConfig,
}

fn default_drag_threshold() -> i32 { 8 }

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            drag_threshold: default_drag_threshold(),
            drag_start: DragStartConfig::default(),
            edge_drag: EdgeDragConfig::default(),
        }
    }
}

impl GestureSettings {
    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        let state_dir = std::env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
            .ok()?;
        Some(state_dir.join("flick/gestures.toml"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load settings from `path`, picking the format from the extension
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings = if is_json(path) {
            Self::from_json_str(&contents)?
        } else {
            Self::from_toml_str(&contents)?
        };
        tracing::info!("Loaded gesture settings from {:?}", path);
        Ok(settings)
    }

    /// Load from the default location, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            tracing::debug!("No gesture settings at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load gesture settings from {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            self.to_toml_string()?
        };
        fs::write(path, contents)?;
        tracing::info!("Saved gesture settings to {:?}", path);
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
}
