//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Countdown presets, custom duration bounds and loop cadence
//! - Step history sync window and day boundary
//! - Display units
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Countdown timer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Quick-start durations in seconds.
    #[serde(default = "default_presets")]
    pub presets: Vec<u32>,
    #[serde(default = "default_custom_min_secs")]
    pub custom_min_secs: u32,
    #[serde(default = "default_custom_max_secs")]
    pub custom_max_secs: u32,
    #[serde(default = "default_custom_step_secs")]
    pub custom_step_secs: u32,
    /// Length of one countdown tick.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Poll interval while paused; bounds resume latency.
    #[serde(default = "default_paused_poll_ms")]
    pub paused_poll_ms: u64,
    /// Ring the alarm on natural expiry.
    #[serde(default = "default_true")]
    pub alarm: bool,
}

/// Step history configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepsConfig {
    /// How far back a sync asks the health source for daily totals.
    #[serde(default = "default_sync_lookback_days")]
    pub sync_lookback_days: u32,
    /// Fixed day boundary offset. Unset means the system time zone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Miles,
    Meters,
}

/// Display configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_distance_unit")]
    pub distance_unit: DistanceUnit,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub steps: StepsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

// Default functions
fn default_presets() -> Vec<u32> {
    vec![30, 45, 60]
}
fn default_custom_min_secs() -> u32 {
    10
}
fn default_custom_max_secs() -> u32 {
    600
}
fn default_custom_step_secs() -> u32 {
    5
}
fn default_tick_ms() -> u64 {
    1000
}
fn default_paused_poll_ms() -> u64 {
    200
}
fn default_true() -> bool {
    true
}
fn default_sync_lookback_days() -> u32 {
    14
}
fn default_distance_unit() -> DistanceUnit {
    DistanceUnit::Miles
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            presets: default_presets(),
            custom_min_secs: default_custom_min_secs(),
            custom_max_secs: default_custom_max_secs(),
            custom_step_secs: default_custom_step_secs(),
            tick_ms: default_tick_ms(),
            paused_poll_ms: default_paused_poll_ms(),
            alarm: true,
        }
    }
}

impl TimerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn paused_poll(&self) -> Duration {
        Duration::from_millis(self.paused_poll_ms.max(1))
    }
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            sync_lookback_days: default_sync_lookback_days(),
            utc_offset_minutes: None,
        }
    }
}

impl StepsConfig {
    /// The configured fixed offset, if any and if representable.
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes.checked_mul(60)?))
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            distance_unit: default_distance_unit(),
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
        if key.is_empty() {
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
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) if value == "none" => serde_json::Value::Null,
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional fields serialize as null; accept numbers for them.
                    serde_json::Value::Null => match value.parse::<i64>() {
                        Ok(n) => serde_json::Value::Number(n.into()),
                        Err(_) if value == "none" => serde_json::Value::Null,
                        Err(_) => serde_json::Value::String(value.into()),
                    },
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults out on first run.
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

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit
    /// the field's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
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
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: Config = toml::from_str("[timer]\npresets = [20]\n").unwrap();
        assert_eq!(parsed.timer.presets, vec![20]);
        assert_eq!(parsed.timer.paused_poll_ms, 200);
        assert_eq!(parsed.steps.sync_lookback_days, 14);
        assert_eq!(parsed.display.distance_unit, DistanceUnit::Miles);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.timer.presets, vec![30, 45, 60]);
        assert_eq!(cfg.timer.custom_min_secs, 10);
        assert_eq!(cfg.timer.custom_max_secs, 600);
        assert_eq!(cfg.timer.custom_step_secs, 5);
        assert_eq!(cfg.timer.tick(), Duration::from_secs(1));
        assert_eq!(cfg.timer.paused_poll(), Duration::from_millis(200));
        assert!(cfg.steps.fixed_offset().is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.tick_ms").as_deref(), Some("1000"));
        assert_eq!(cfg.get("timer.alarm").as_deref(), Some("true"));
        assert_eq!(cfg.get("display.distance_unit").as_deref(), Some("miles"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("timer.alarm", "false").unwrap();
        cfg.apply("timer.paused_poll_ms", "50").unwrap();
        cfg.apply("display.distance_unit", "meters").unwrap();
        cfg.apply("timer.presets", "[15, 90]").unwrap();
        assert!(!cfg.timer.alarm);
        assert_eq!(cfg.timer.paused_poll_ms, 50);
        assert_eq!(cfg.display.distance_unit, DistanceUnit::Meters);
        assert_eq!(cfg.timer.presets, vec![15, 90]);
    }

    #[test]
    fn apply_sets_optional_offset() {
        let mut cfg = Config::default();
        cfg.apply("steps.utc_offset_minutes", "-300").unwrap();
        assert_eq!(cfg.steps.utc_offset_minutes, Some(-300));
        assert_eq!(
            cfg.steps.fixed_offset(),
            FixedOffset::west_opt(5 * 3600)
        );
        cfg.apply("steps.utc_offset_minutes", "none").unwrap();
        assert_eq!(cfg.steps.utc_offset_minutes, None);
        assert!(cfg.apply("timer.tick_ms", "none").is_err());
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.apply("timer.nonexistent_key", "1").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("timer.alarm", "not_a_bool").is_err());
        assert!(cfg.apply("display.distance_unit", "furlongs").is_err());
        assert_eq!(cfg, Config::default());
    }
}
