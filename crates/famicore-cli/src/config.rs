//! JSON configuration: logging level, video scale, controller bindings.
//!
//! A default file is written on first run so users have something concrete
//! to edit. Key names are plain strings; a graphical front end translates
//! them into its own keycodes.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub video: VideoConfig,
    pub controller: ControllerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "famicore_core=debug".
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub scale: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub player1: BTreeMap<String, String>,
    pub player2: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            video: VideoConfig::default(),
            controller: ControllerConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self { scale: 3 }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let player1 = [
            ("A", "J"),
            ("B", "K"),
            ("Select", "RShift"),
            ("Start", "Return"),
            ("Up", "W"),
            ("Down", "S"),
            ("Left", "A"),
            ("Right", "D"),
        ];
        let player2 = [
            ("A", "Kp5"),
            ("B", "Kp6"),
            ("Select", "Kp8"),
            ("Start", "Kp9"),
            ("Up", "Up"),
            ("Down", "Down"),
            ("Left", "Left"),
            ("Right", "Right"),
        ];
        let to_map = |pairs: [(&str, &str); 8]| {
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self {
            player1: to_map(player1),
            player2: to_map(player2),
        }
    }
}

impl Config {
    /// Loads the config, falling back to (and persisting) the defaults when
    /// the file is missing or unreadable.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            match serde_json::from_str(&text) {
                Ok(config) => return Ok(config),
                Err(err) => {
                    warn!(%err, path = %path.display(), "config unreadable, using defaults");
                    return Ok(Self::default());
                }
            }
        }

        let config = Self::default();
        let text = serde_json::to_string_pretty(&config)?;
        if let Err(err) = fs::write(path, text) {
            warn!(%err, path = %path.display(), "could not write default config");
        }
        Ok(config)
    }
}
