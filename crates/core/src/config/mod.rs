use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ReplayError, Result};

/// Top-level configuration structure for a replay run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub log: LogFormat,
    pub playback: PlaybackConfig,
}

impl ReplayConfig {
    /// Parses a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.log.min_fields < LogFormat::REQUIRED_FIELDS {
            return Err(ReplayError::Config(format!(
                "log.min_fields must be at least {}, got {}",
                LogFormat::REQUIRED_FIELDS,
                self.log.min_fields
            )));
        }
        if !self.playback.speed.is_finite() || self.playback.speed <= 0.0 {
            return Err(ReplayError::Config(format!(
                "playback.speed must be a positive number, got {}",
                self.playback.speed
            )));
        }
        Ok(())
    }
}

/// Shape of the event log consumed by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFormat {
    pub delimiter: char,
    pub has_header: bool,
    /// Rows with fewer fields than this are dropped. Never below
    /// [`LogFormat::REQUIRED_FIELDS`].
    pub min_fields: usize,
}

impl LogFormat {
    /// Event type, timestamp, key code, key char, button, x and y.
    pub const REQUIRED_FIELDS: usize = 7;
}

impl Default for LogFormat {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
            min_fields: Self::REQUIRED_FIELDS,
        }
    }
}

/// Knobs that shape how records are paced and dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Divides every inter-event gap. 1.0 reproduces the original pacing.
    pub speed: f64,
    /// Move the cursor to the recorded coordinate before each button press or release.
    pub move_cursor_on_click: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            move_cursor_on_click: true,
        }
    }
}
