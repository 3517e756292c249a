use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file looked up in the working directory at startup.
pub const SETTINGS_FILE: &str = "stereoview.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tunables for the viewer. Every field falls back to its default when
/// missing from the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub window_width: u32,
    pub window_height: u32,
    pub window_title: String,
    pub background_model: String,
    pub sky_model: String,
    pub light_model: String,
    pub move_speed: f32,
    /// Cursor pixels per unit of yaw / pitch in navigation mode.
    pub look_sensitivity: f32,
    pub rotate_step: f32,
    pub light_step: f32,
    pub pick_threshold: f32,
    /// Drag deltas are divided by (window extent / drag_divisor).
    pub drag_divisor: f32,
    pub drag_vertical_damping: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            window_width: 1400,
            window_height: 600,
            window_title: "twoeye_modelling".to_string(),
            background_model: "objs/background.obj".to_string(),
            sky_model: "objs/sky.obj".to_string(),
            light_model: "objs/lamp.obj".to_string(),
            move_speed: 0.05,
            look_sensitivity: 1000.0,
            rotate_step: 0.05,
            light_step: 0.05,
            pick_threshold: 0.1,
            drag_divisor: 8.0,
            drag_vertical_damping: 5.0,
        }
    }
}

impl ViewerSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reads the settings file if present. A missing file means defaults;
    /// an unreadable or malformed one is reported and defaults are used.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(settings) => {
                log::info!("Loaded viewer settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!(
                    "Ignoring viewer settings at {}: {}",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }
}
