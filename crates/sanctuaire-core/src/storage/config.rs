//! TOML-based application configuration.
//!
//! Holds deployment settings that are not user preferences:
//! - Session timings (tick cadence, trailing silence after cues)
//! - Audio player used for cues
//! - Display-retention behaviour
//! - An optional replacement for the built-in step sequence
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::data_dir;
use super::preferences::Preferences;
use crate::display::InhibitGuard;
use crate::error::{ConfigError, ValidationError};
use crate::session::{
    default_steps, SessionConfig, StepDefinition, StepSequence, DEFAULT_TICK_INTERVAL_MS,
    DEFAULT_TRAILING_MARGIN_MS,
};

/// Session timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimingConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_trailing_margin_ms")]
    pub trailing_margin_ms: u64,
}

/// Cue playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// External program that plays a sound file given as its last argument.
    #[serde(default = "default_player")]
    pub player: String,
    #[serde(default)]
    pub player_args: Vec<String>,
    /// Directory holding `bell.wav`, `bowl.wav`, `gong.wav`.
    /// Defaults to `<data dir>/sounds`.
    #[serde(default)]
    pub sound_dir: Option<String>,
}

/// Display-retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub keep_awake: bool,
    #[serde(default = "InhibitGuard::default_command")]
    pub inhibit_command: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionTimingConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// Replaces the built-in guided sequence when set.
    #[serde(default)]
    pub custom_steps: Option<Vec<StepDefinition>>,
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}
fn default_trailing_margin_ms() -> u64 {
    DEFAULT_TRAILING_MARGIN_MS
}
fn default_true() -> bool {
    true
}
fn default_player() -> String {
    "paplay".into()
}

impl Default for SessionTimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            trailing_margin_ms: default_trailing_margin_ms(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            player: default_player(),
            player_args: Vec::new(),
            sound_dir: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            keep_awake: true,
            inhibit_command: InhibitGuard::default_command(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionTimingConfig::default(),
            audio: AudioConfig::default(),
            display: DisplayConfig::default(),
            custom_steps: None,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_)
                    | serde_json::Value::Array(_)
                    | serde_json::Value::Null => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |e: serde_json::Error| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        };
        let mut json = serde_json::to_value(&*self).map_err(invalid)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(invalid)?;
        Ok(())
    }

    /// The configured step definitions, or the built-in sequence.
    pub fn step_definitions(&self) -> Vec<StepDefinition> {
        self.custom_steps.clone().unwrap_or_else(default_steps)
    }

    pub fn sound_dir(&self) -> PathBuf {
        match &self.audio.sound_dir {
            Some(dir) => PathBuf::from(dir),
            None => data_dir()
                .map(|d| d.join("sounds"))
                .unwrap_or_else(|_| PathBuf::from("sounds")),
        }
    }

    /// Build the guided-session configuration from these settings and the
    /// user's preferences.
    ///
    /// # Errors
    /// Fails if the resolved step sequence is invalid.
    pub fn session_config(&self, preferences: &Preferences) -> Result<SessionConfig, ValidationError> {
        let steps = StepSequence::resolve(&self.step_definitions(), preferences)?;
        Ok(self.apply_timings(SessionConfig::new(steps), preferences))
    }

    /// Apply timing settings and cue preferences to `session`.
    pub fn apply_timings(&self, session: SessionConfig, preferences: &Preferences) -> SessionConfig {
        session
            .with_cue_kind(preferences.cue_kind())
            .with_cue_interval_ms(preferences.cue_interval_ms())
            .with_trailing_margin_ms(self.session.trailing_margin_ms)
            .with_tick_interval_ms(self.session.tick_interval_ms)
    }
}
