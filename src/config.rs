//! User configuration for the focus timer.
//!
//! Preferences are read from a JSON file. Timer durations are fixed per mode
//! and are not part of the configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::Mode;

/// Smallest accepted progress bar width.
pub const MIN_PROGRESS_BAR_WIDTH: u16 = 5;

/// Largest accepted progress bar width.
pub const MAX_PROGRESS_BAR_WIDTH: u16 = 100;

fn default_progress_bar_width() -> u16 {
    20
}

fn default_show_emoji() -> bool {
    true
}

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("設定ファイルが見つかりません: {}", .0.display())]
    NotFound(PathBuf),

    /// The config file could not be read.
    #[error("設定ファイルの読み込みに失敗しました: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid JSON for [`TimerConfig`].
    #[error("設定ファイルの形式が不正です: {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range.
    #[error("設定値が不正です: {0}")]
    Invalid(String),
}

/// Focus timer preferences.
///
/// # Example
///
/// ```
/// use focus_timer::config::TimerConfig;
/// use focus_timer::types::Mode;
///
/// let config = TimerConfig::default();
/// assert_eq!(config.initial_mode, Mode::Work);
/// assert!(!config.auto_start);
/// assert_eq!(config.progress_bar_width, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Mode selected when the session opens.
    #[serde(default)]
    pub initial_mode: Mode,

    /// Whether to start counting down as soon as the session opens.
    #[serde(default)]
    pub auto_start: bool,

    /// Width of the terminal progress bar in cells.
    #[serde(default = "default_progress_bar_width")]
    pub progress_bar_width: u16,

    /// Whether to prefix titles with the mode emoji.
    #[serde(default = "default_show_emoji")]
    pub show_emoji: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            initial_mode: Mode::Work,
            auto_start: false,
            progress_bar_width: default_progress_bar_width(),
            show_emoji: default_show_emoji(),
        }
    }
}

impl TimerConfig {
    /// Returns the default config file location, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("focus-timer").join("config.json"))
    }

    /// Loads the configuration.
    ///
    /// With an explicit `path` the file must exist. Without one, the default
    /// location is tried and a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Reads and validates a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PROGRESS_BAR_WIDTH..=MAX_PROGRESS_BAR_WIDTH).contains(&self.progress_bar_width) {
            return Err(ConfigError::Invalid(format!(
                "progress_bar_width は{}-{}の範囲で指定してください",
                MIN_PROGRESS_BAR_WIDTH, MAX_PROGRESS_BAR_WIDTH
            )));
        }
        Ok(())
    }
}
