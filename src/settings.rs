//! Simulation settings with persistence
//!
//! Settings are saved to `~/.config/saltwake/settings.toml`

use std::fs;
use std::path::PathBuf;

use saltwake_game::AiConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All settings for a headless run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub ai: AiConfig,
    pub run: RunSettings,
}

impl SimSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("saltwake"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                warn!("Failed to parse settings: {}, using defaults", e);
                Self::default()
            }),
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let settings: Self = toml::from_str(content)?;
        info!("Loaded settings");
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        let path = dir.join("settings.toml");

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Length and pacing of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Number of ticks to simulate
    pub ticks: u64,
    /// Real seconds per tick
    pub tick_seconds: f32,
    /// World time at the first tick, "HH:MM"
    pub start_time: String,
    /// Log a snapshot of every NPC this often (ticks)
    pub report_every: u64,
    /// JSON roster to load instead of the built-in harbor cast
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roster: Option<PathBuf>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            ticks: 600,
            tick_seconds: 0.25,
            start_time: "06:00".to_string(),
            report_every: 100,
            roster: None,
        }
    }
}
