//! Playback settings persistence
//!
//! Handles loading and saving the recognized configuration options.
//! Every field carries a serde default so partial files still load.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coordinator settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Playback policy flags
    #[serde(default)]
    pub playback: PlaybackSettings,
    /// Remote control rates and preferred skip intervals
    #[serde(default)]
    pub remote: RemoteSettings,
    /// Artwork resize target
    #[serde(default)]
    pub artwork: ArtworkSettings,
    /// Now-playing publishing
    #[serde(default)]
    pub now_playing: NowPlayingSettings,
    /// Log filter
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Playback-related settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Start the engine as soon as the item is ready and positioned
    #[serde(default)]
    pub auto_play_when_item_ready: bool,
    /// Resume after an interruption ends, if the session hints it may
    #[serde(default = "default_true")]
    pub should_resume_when_interrupt_ended: bool,
    /// Periodic time sampling interval in milliseconds
    #[serde(default = "default_observe_interval_ms")]
    pub observe_time_interval_ms: u64,
    /// Ask the resource collaborator to cache remote items
    #[serde(default)]
    pub caching_enabled: bool,
}

impl PlaybackSettings {
    pub fn observe_time_interval(&self) -> Duration {
        Duration::from_millis(self.observe_time_interval_ms)
    }
}

/// Remote control settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Engine rate while a backward scrub is held
    #[serde(default = "default_rewind_rate")]
    pub rewind_rate: f32,
    /// Engine rate while a forward scrub is held
    #[serde(default = "default_fast_forward_rate")]
    pub fast_forward_rate: f32,
    #[serde(default = "default_skip_interval")]
    pub skip_forward_interval_secs: f64,
    #[serde(default = "default_skip_interval")]
    pub skip_backward_interval_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtworkSettings {
    /// Longest edge of resized artwork, in pixels
    #[serde(default = "default_artwork_size")]
    pub target_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive, `RUST_LOG` wins over it
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_true() -> bool {
    true
}

fn default_observe_interval_ms() -> u64 {
    // 1/30 s
    33
}

fn default_rewind_rate() -> f32 {
    -2.0
}

fn default_fast_forward_rate() -> f32 {
    2.0
}

fn default_skip_interval() -> f64 {
    15.0
}

fn default_artwork_size() -> u32 {
    300
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            auto_play_when_item_ready: false,
            should_resume_when_interrupt_ended: true,
            observe_time_interval_ms: default_observe_interval_ms(),
            caching_enabled: false,
        }
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            rewind_rate: default_rewind_rate(),
            fast_forward_rate: default_fast_forward_rate(),
            skip_forward_interval_secs: default_skip_interval(),
            skip_backward_interval_secs: default_skip_interval(),
        }
    }
}

impl Default for ArtworkSettings {
    fn default() -> Self {
        Self {
            target_size: default_artwork_size(),
        }
    }
}

impl Default for NowPlayingSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "cadenza", "Cadenza")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return defaults if not found
    pub fn load() -> Self {
        let loaded = Self::file_path().and_then(|path| match Self::load_from_file(&path) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::debug!("Using default settings ({})", e);
                None
            }
        });

        match loaded {
            Some(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    tracing::warn!("Invalid settings, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Save settings to the default file
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(path) = Self::file_path() {
            self.save_to_file(&path)
        } else {
            Err(SettingsError::Io(
                "Could not determine config directory".to_string(),
            ))
        }
    }

    /// Save settings to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| SettingsError::Io(e.to_string()))?;
        Ok(())
    }

    /// Basic sanity checks on loaded values
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.playback.observe_time_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "playback.observe_time_interval_ms must be >= 1".to_string(),
            ));
        }
        if self.artwork.target_size == 0 {
            return Err(SettingsError::Invalid(
                "artwork.target_size must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings errors
#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    #[error("settings IO error: {0}")]
    Io(String),
    #[error("settings parse error: {0}")]
    Parse(String),
    #[error("invalid settings: {0}")]
    Invalid(String),
}
