// src/config.rs
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::feedback::OverlayStyle;

pub const SETTINGS_FILE: &str = "asana_tracker.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Extra pose profiles, merged over the built-in ones.
    pub profiles_path: Option<PathBuf>,
    pub default_pose: String,
    /// JSON-lines landmark recording to replay instead of the simulator.
    pub recording_path: Option<PathBuf>,
    pub simulation_period_secs: f64,
    pub speak_cues: bool,
    pub record_sessions: bool,
    pub output_directory: PathBuf,
    pub overlay: OverlayStyle,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            profiles_path: None,
            default_pose: "trikonasana".to_string(),
            recording_path: None,
            simulation_period_secs: 12.0,
            speak_cues: true,
            record_sessions: true,
            output_directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("AsanaTracker")))
                .unwrap_or_else(|| PathBuf::from("./output")),
            overlay: OverlayStyle::default(),
        }
    }
}

impl AppSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Falls back to defaults when the file is absent; a malformed file is
    /// reported and also falls back.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring settings file");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
