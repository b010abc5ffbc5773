//! Application state types
//!
//! Contains the state handed from the front end into the pipeline:
//! - ConverterSettings: persisted converter preferences
//! - Selection: the "currently selected" source/destination pair

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default legacy scale filter passed to the transcoder as `-vf`
pub const DEFAULT_SCALE_FILTER: &str = "scale=300:-1";

/// Converter preferences
///
/// Persisted to <data dir>/FemPEG/settings.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterSettings {
    /// Explicit ffmpeg location. None means search the usual places.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,
    /// Whether to copy cover art into converted files
    #[serde(default = "default_true")]
    pub embed_artwork: bool,
    /// Image used when a source has no embedded picture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_artwork: Option<PathBuf>,
    /// Extension of files picked up in folder mode
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    /// Extension given to converted files
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
    /// Video filter passed as `-vf`; null drops the flag
    #[serde(default = "default_scale_filter")]
    pub scale_filter: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_source_extension() -> String {
    "flac".to_string()
}

fn default_output_extension() -> String {
    "m4a".to_string()
}

fn default_scale_filter() -> Option<String> {
    Some(DEFAULT_SCALE_FILTER.to_string())
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            embed_artwork: true,
            placeholder_artwork: None,
            source_extension: default_source_extension(),
            output_extension: default_output_extension(),
            scale_filter: default_scale_filter(),
        }
    }
}

impl ConverterSettings {
    const SETTINGS_FILE: &'static str = "settings.json";

    /// Get the app data directory (<data dir>/FemPEG/)
    fn get_app_data_dir() -> Result<PathBuf, String> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| "Could not determine data directory".to_string())?;

        let app_dir = data_dir.join("FemPEG");

        if !app_dir.exists() {
            std::fs::create_dir_all(&app_dir)
                .map_err(|e| format!("Failed to create app data directory: {}", e))?;
        }

        Ok(app_dir)
    }

    /// Path of the settings file
    pub fn settings_path() -> Result<PathBuf, String> {
        Ok(Self::get_app_data_dir()?.join(Self::SETTINGS_FILE))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        match Self::settings_path().and_then(|p| Self::load_from(&p)) {
            Ok(settings) => {
                log::debug!("Loaded converter settings from disk");
                settings
            }
            Err(e) => {
                log::debug!("Using default converter settings: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Err("Settings file not found".to_string());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings: {}", e))?;

        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse settings: {}", e))
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<PathBuf, String> {
        let path = Self::settings_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        log::debug!("Saved converter settings to {:?}", path);
        Ok(())
    }

    /// Destination for a source file: same location, output extension
    pub fn output_path_for(&self, source: &Path) -> PathBuf {
        source.with_extension(&self.output_extension)
    }
}

/// The source/destination pair a front end shows as "current"
///
/// Folder mode overwrites it on every file, so after a batch it describes the
/// last file processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
}

impl Selection {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(source.into()),
            destination: None,
        }
    }

    pub fn select(&mut self, source: &Path) {
        self.source = Some(source.to_path_buf());
        self.destination = None;
    }
}
