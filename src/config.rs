//! Application configuration management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Catalog API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Player configuration
    #[serde(default)]
    pub player: PlayerConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// UI configuration
    #[serde(default)]
    pub ui: UiConfig,

    /// Local storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Catalog API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the MusicStream API (e.g., "http://127.0.0.1:5000")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Player configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Volume level (0-100)
    #[serde(default = "default_volume")]
    pub volume: u8,

    /// Preferred stream quality (e.g., "160kbps"); the best available is used
    /// when a track does not offer it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_quality: Option<String>,
}

/// Search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search fires
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// UI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show the queue panel
    #[serde(default = "default_true")]
    pub show_queue: bool,

    /// Show album art (requires sixel/kitty support)
    #[serde(default = "default_true")]
    pub show_album_art: bool,

    /// Publish playback to the desktop media session (MPRIS)
    #[serde(default = "default_true")]
    pub media_keys: bool,
}

/// Local storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for liked songs; defaults to the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    String::from("http://127.0.0.1:5000")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_volume() -> u8 {
    70
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            stream_quality: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_queue: true,
            show_album_art: true,
            media_keys: true,
        }
    }
}

impl Config {
    /// Get the default configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine config directory"))?;

        Ok(config_dir.join("musicstream-tui").join("config.toml"))
    }

    /// Load configuration from `path`, or the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        Self::parse(&contents)
    }

    /// Parse and clamp a TOML document.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;

        // Clamp values to valid ranges
        config.player.volume = config.player.volume.min(100);
        config.search.debounce_ms = config.search.debounce_ms.max(1);
        config.api.timeout_secs = config.api.timeout_secs.max(1);
        config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();

        Ok(config)
    }

    /// Directory holding persisted liked songs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine data directory"))?;

        Ok(data_dir.join("musicstream-tui"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }

    /// Initial volume in `[0, 1]`.
    pub fn volume(&self) -> f32 {
        f32::from(self.player.volume) / 100.0
    }

    /// Check if the API URL is usable.
    pub fn is_valid(&self) -> bool {
        self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")
    }
}
