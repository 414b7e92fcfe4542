// Preferences - read-only JSON settings consumed at session start
//
// Any subset of fields may be absent. A missing file or one that fails to
// parse yields the defaults; problems are logged, never returned to callers.

use crate::tone::{BuiltinTone, ToneRef};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "pomodoro_config.json";

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid preferences JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PreferencesResult<T> = Result<T, PreferencesError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub default_minutes: u32,
    pub sound_path: Option<PathBuf>,
    pub interval_minutes: u32,
    pub interval_enabled: bool,
    pub builtin_tone_index: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_minutes: 25,
            sound_path: None,
            interval_minutes: 3,
            interval_enabled: true,
            builtin_tone_index: BuiltinTone::DEFAULT_COMPLETION.index(),
        }
    }
}

impl Preferences {
    /// `<config dir>/pomodoro/pomodoro_config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pomodoro").join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No config directory, using default preferences");
                Self::default()
            }
        }
    }

    /// Load from `path`, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No preferences file, using defaults");
            return Self::default();
        }

        match Self::read(path) {
            Ok(preferences) => preferences,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Ignoring preferences: {}", e);
                Self::default()
            }
        }
    }

    /// Strict variant of `load_from`
    pub fn read(path: &Path) -> PreferencesResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Reminder interval in seconds, or None when reminders are off
    pub fn interval_seconds(&self) -> Option<u32> {
        if self.interval_enabled && self.interval_minutes > 0 {
            Some(self.interval_minutes.saturating_mul(60))
        } else {
            None
        }
    }

    /// Session length in seconds; zero minutes falls back to the default
    pub fn default_seconds(&self) -> u32 {
        let minutes = if self.default_minutes == 0 {
            Self::default().default_minutes
        } else {
            self.default_minutes
        };
        minutes.saturating_mul(60)
    }

    /// Selected built-in tone; out-of-range indices fall back to the default
    pub fn builtin_tone(&self) -> BuiltinTone {
        BuiltinTone::from_index(self.builtin_tone_index).unwrap_or_else(|| {
            tracing::warn!(
                index = self.builtin_tone_index,
                "Unknown built-in tone index, using default"
            );
            BuiltinTone::DEFAULT_COMPLETION
        })
    }

    /// Completion tone: the custom file if set and present, else the built-in choice
    pub fn completion_tone(&self) -> ToneRef {
        match &self.sound_path {
            Some(path) if path.is_file() => ToneRef::File(path.clone()),
            Some(path) if !path.as_os_str().is_empty() => {
                tracing::warn!(path = %path.display(), "Custom sound not found, using built-in tone");
                ToneRef::Builtin(self.builtin_tone())
            }
            _ => ToneRef::Builtin(self.builtin_tone()),
        }
    }
}
