use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_BPM, DEFAULT_GRID_SNAP, DEFAULT_PROCESSING_DELAY_MS, DEFAULT_TIMELINE_BEATS,
    DEFAULT_TRACK_COUNT, DEFAULT_ZOOM, MIN_CLIP_DURATION, PIXELS_PER_BEAT,
};
use crate::grid::GridSnap;
use crate::input::GestureConfig;
use crate::paths::config_path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timeline: TimelineConfig,
    pub transport: TransportConfig,
    pub midi: MidiConfig,
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub pixels_per_beat: f64,
    pub initial_zoom: f64,
    pub initial_beats: f64,
    pub initial_tracks: usize,
    pub snap_to_grid: bool,
    pub grid_size: f64,
    pub min_clip_duration: f64,
    pub gestures: GestureConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub bpm: f64,
    pub time_signature: (u32, u32),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    pub enabled: bool,
    pub preferred_output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub processing_delay_ms: u64,
    pub stop_on_track_selection: bool,
    pub follow_playhead: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            pixels_per_beat: PIXELS_PER_BEAT,
            initial_zoom: DEFAULT_ZOOM,
            initial_beats: DEFAULT_TIMELINE_BEATS,
            initial_tracks: DEFAULT_TRACK_COUNT,
            snap_to_grid: true,
            grid_size: DEFAULT_GRID_SNAP,
            min_clip_duration: MIN_CLIP_DURATION,
            gestures: GestureConfig::default(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            time_signature: (4, 4),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            processing_delay_ms: DEFAULT_PROCESSING_DELAY_MS,
            stop_on_track_selection: false,
            follow_playhead: true,
        }
    }
}

impl TimelineConfig {
    pub fn grid(&self) -> GridSnap {
        GridSnap {
            enabled: self.snap_to_grid,
            grid_size: self.grid_size,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(path) = config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    /// Missing file yields defaults; unknown or absent keys fall back per field.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        log::debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.timeline.grid_size = 0.5;
        config.midi.preferred_output = Some("Synth".into());
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "transport": { "bpm": 90.0 } }"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.transport.bpm, 90.0);
        assert_eq!(config.transport.time_signature, (4, 4));
        assert_eq!(config.timeline, TimelineConfig::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
