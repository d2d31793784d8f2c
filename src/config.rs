//! Runtime settings for the music controller.
//!
//! Settings come from an optional JSON file (`RUSTY_TUNES_CONFIG`, default
//! `configs/rusty_tunes.json`). Every field has a default, so a missing file
//! or a partial one is fine; a malformed or out-of-range file is an error.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::commands::music::utils::playback_session::{MAX_VOLUME, MIN_VOLUME};

pub const CONFIG_PATH_VAR: &str = "RUSTY_TUNES_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "configs/rusty_tunes.json";

/// Discord allows at most 25 options in a select menu.
const MAX_SEARCH_LIMIT: usize = 25;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Volume a fresh session starts at.
    pub default_volume: f64,
    /// Amount the volume buttons add or remove.
    pub volume_step: f64,
    /// Results offered by `/search` when no count is given.
    pub search_limit: usize,
    pub ytdlp_path: String,
    /// `yt-dlp -f` format selector.
    pub audio_format: String,
    #[serde(with = "humantime_serde")]
    pub resolve_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_volume: 1.0,
            volume_step: 0.2,
            search_limit: 5,
            ytdlp_path: "yt-dlp".to_string(),
            audio_format: "bestaudio[ext=m4a]/bestaudio/best".to_string(),
            resolve_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load from the path in `RUSTY_TUNES_CONFIG`, or the default path.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_VOLUME..=MAX_VOLUME).contains(&self.default_volume) {
            return Err(ConfigError::Invalid {
                field: "default_volume",
                reason: format!("{} is outside {}..={}", self.default_volume, MIN_VOLUME, MAX_VOLUME),
            });
        }
        if !(self.volume_step > 0.0 && self.volume_step <= MAX_VOLUME) {
            return Err(ConfigError::Invalid {
                field: "volume_step",
                reason: format!("{} must be above 0 and at most {}", self.volume_step, MAX_VOLUME),
            });
        }
        if !(1..=MAX_SEARCH_LIMIT).contains(&self.search_limit) {
            return Err(ConfigError::Invalid {
                field: "search_limit",
                reason: format!("{} is outside 1..={}", self.search_limit, MAX_SEARCH_LIMIT),
            });
        }
        if self.ytdlp_path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "ytdlp_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.resolve_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "resolve_timeout",
                reason: "must be longer than zero".to_string(),
            });
        }
        Ok(())
    }
}
