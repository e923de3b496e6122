//! TOML-based application configuration.
//!
//! Stores engine tunables including:
//! - Session timer defaults (duration, tick interval, delta clamp)
//! - Progress storage namespace and database file
//! - Calendar offset for day-streak achievements
//! - Per-game adaptation overrides
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::adaptive::AdaptationConfig;
use crate::error::ConfigError;
use crate::progress::Namespace;
use crate::timer::SessionTimerConfig;

/// Defaults applied to every session timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerDefaults {
    #[serde(default = "default_duration_sec")]
    pub default_duration_sec: f64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_max_tick_delta_ms")]
    pub max_tick_delta_ms: u64,
    #[serde(default = "default_true")]
    pub sync_visibility: bool,
}

/// Where progress records live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_database")]
    pub database: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementsConfig {
    /// Offset used to bucket sessions into calendar days. Local offset when unset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerDefaults,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub achievements: AchievementsConfig,
    /// Replaces the built-in tunable for the named game.
    #[serde(default)]
    pub adaptation: BTreeMap<String, AdaptationConfig>,
}

fn default_duration_sec() -> f64 {
    60.0
}
fn default_tick_interval_ms() -> u64 {
    50
}
fn default_max_tick_delta_ms() -> u64 {
    200
}
fn default_true() -> bool {
    true
}
fn default_prefix() -> String {
    "spiread.progress".into()
}
fn default_version() -> String {
    "v1".into()
}
fn default_database() -> String {
    "spiread.db".into()
}

impl Default for TimerDefaults {
    fn default() -> Self {
        Self {
            default_duration_sec: default_duration_sec(),
            tick_interval_ms: default_tick_interval_ms(),
            max_tick_delta_ms: default_max_tick_delta_ms(),
            sync_visibility: true,
        }
    }
}

impl TimerDefaults {
    /// Timer config for one session; `duration_sec` overrides the default.
    pub fn session(&self, duration_sec: Option<f64>) -> SessionTimerConfig {
        SessionTimerConfig {
            duration_sec: duration_sec.unwrap_or(self.default_duration_sec),
            autostart: false,
            sync_visibility: self.sync_visibility,
            max_tick_delta_ms: self.max_tick_delta_ms,
            tick_interval_ms: self.tick_interval_ms,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            version: default_version(),
            database: default_database(),
        }
    }
}

impl StorageConfig {
    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.prefix, &self.version)
    }
}

impl AchievementsConfig {
    pub fn utc_offset_secs(&self) -> i32 {
        match self.utc_offset_minutes {
            Some(minutes) => minutes.saturating_mul(60),
            None => chrono::Local::now().offset().local_minus_utc(),
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
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => parse_number(value)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional fields: "none" clears, numbers stay numbers.
                    serde_json::Value::Null => match value {
                        "none" | "null" => serde_json::Value::Null,
                        _ => parse_number(value)
                            .unwrap_or_else(|| serde_json::Value::String(value.into())),
                    },
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults when no file exists yet.
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
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
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

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<i64>() {
        Some(serde_json::Value::Number(n.into()))
    } else {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    }
}
