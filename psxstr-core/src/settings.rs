//! Shared scan settings.
//!
//! The settings file is always `~/.config/psxstr/settings.toml`. Every key
//! is optional; a missing or unreadable file yields the defaults, which
//! are the thresholds the stream heuristics were tuned with.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SectorError;

/// Default maximum sector distance between consecutive chunks of a video.
pub const DEFAULT_MAX_SECTOR_GAP: u64 = 100;

/// Default maximum forward jump in header frame number within one stream.
pub const DEFAULT_MAX_FRAME_JUMP: u64 = 1000;

/// Canonical path to the shared settings file: `~/.config/psxstr/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("psxstr").join("settings.toml")
}

/// Top-level settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scan: ScanSettings,
}

/// The `[scan]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Sectors allowed between consecutive chunks (and between frames)
    /// before a video is considered over.
    pub max_sector_gap: u64,
    /// Header frame number jump that splits a stream.
    pub max_frame_jump: u64,
    /// CSV sector lookup table for games whose headers carry no usable
    /// frame number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_table: Option<PathBuf>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_sector_gap: DEFAULT_MAX_SECTOR_GAP,
            max_frame_jump: DEFAULT_MAX_FRAME_JUMP,
            lookup_table: None,
        }
    }
}

impl Settings {
    /// Load from the canonical settings path, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from(&settings_path()) {
            Ok(settings) => settings,
            Err(e) => {
                log::debug!("Using default settings: {e}");
                Self::default()
            }
        }
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, SectorError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, SectorError> {
        toml::from_str(contents).map_err(|e| SectorError::settings(e.to_string()))
    }

    /// Write the settings atomically (temp file + rename).
    pub fn save_to(&self, path: &Path) -> Result<(), SectorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized =
            toml::to_string_pretty(self).map_err(|e| SectorError::settings(e.to_string()))?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &serialized)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
