//! Configuration file support for Stretch.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/stretch/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub exercises: Vec<CustomExercise>,

    #[serde(default)]
    pub routines: Vec<CustomRoutine>,
}

/// Timing parameters for the playback engine
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_side_switch_delay_ms")]
    pub side_switch_delay_ms: u64,

    #[serde(default = "default_advance_delay_ms")]
    pub advance_delay_ms: u64,

    /// Presenter policy: resume the countdown after manual navigation
    #[serde(default)]
    pub auto_play_on_navigate: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            side_switch_delay_ms: default_side_switch_delay_ms(),
            advance_delay_ms: default_advance_delay_ms(),
            auto_play_on_navigate: false,
        }
    }
}

impl PlaybackConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn side_switch_delay(&self) -> Duration {
        Duration::from_millis(self.side_switch_delay_ms)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be positive".into()));
        }
        Ok(())
    }
}

/// User-defined exercise
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomExercise {
    pub id: String,
    pub name: String,
    pub duration_seconds: u32,
    #[serde(default)]
    pub needs_side_switch: bool,
}

/// User-defined routine referencing built-in or custom exercise ids
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomRoutine {
    pub id: String,
    pub name: String,
    pub exercises: Vec<String>,
}

// Default value functions
fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_side_switch_delay_ms() -> u64 {
    3000
}

fn default_advance_delay_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.playback.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        base.join("stretch").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
