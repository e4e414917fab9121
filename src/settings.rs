//! Game center settings
//!
//! Persisted as JSON next to the data directory. Missing fields take their
//! defaults, and a missing or unreadable file falls back to defaults entirely.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Game center settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of `accounts/` and `logs.json`
    pub data_dir: PathBuf,
    /// Players shown on the leaderboard
    pub leaderboard_size: usize,
    /// Session log entries kept on disk
    pub history_capacity: usize,
    /// Delay between GameOver and the completion callback (ms)
    pub game_over_delay_ms: u64,
    /// Maximum ticks per frame
    pub max_substeps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            leaderboard_size: LEADERBOARD_SIZE,
            history_capacity: HISTORY_CAPACITY,
            game_over_delay_ms: GAME_OVER_DELAY_MS,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

impl Settings {
    /// Settings rooted at a specific data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn accounts_dir(&self) -> PathBuf {
        self.data_dir.join("accounts")
    }

    pub fn logs_file(&self) -> PathBuf {
        self.data_dir.join("logs.json")
    }

    pub fn game_over_delay(&self) -> Duration {
        Duration::from_millis(self.game_over_delay_ms)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file
    #[cfg(test)]
    pub(crate) fn save(&self, path: &Path) -> crate::error::Result<()> {
        use crate::error::CenterError;

        let json = serde_json::to_string_pretty(self).map_err(|e| CenterError::json(path, e))?;
        fs::write(path, json).map_err(|e| CenterError::io(path, e))?;
        log::info!("Settings saved");
        Ok(())
    }
}
