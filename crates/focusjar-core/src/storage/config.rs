//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Session length
//! - Advisory service endpoint
//! - Log level
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::MAX_SESSION_HOURS;

const MAX_LENGTH_MIN: u32 = (MAX_SESSION_HOURS * 60) as u32;

/// Session timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_length_min")]
    pub length_min: u32,
}

/// Advisory service configuration. An empty endpoint disables the advisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_length_min() -> u32 {
    30
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            length_min: default_length_min(),
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SessionConfig {
    /// Configured length, clamped to 1 minute ..= 24 hours so a hand-edited
    /// file cannot start a session that would not survive a restart.
    pub fn length(&self) -> Duration {
        Duration::minutes(i64::from(self.length_min.clamp(1, MAX_LENGTH_MIN)))
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
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => serde_json::Value::Number(
                    value
                        .parse::<u64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                        .into(),
                ),
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("not a leaf key".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
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

    /// Load from the data directory, writing defaults if the file is missing.
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid config, using defaults");
            Self::default()
        })
    }

    /// Like [`Config::load`] but hands back the load failure so a caller can
    /// report it once its own logging is up.
    pub fn try_load() -> Result<Self, ConfigError> {
        Self::try_load_from(&Self::path()?)
    }

    /// Load from `path`. A missing file is created with defaults; an
    /// unreadable one is ignored in favour of defaults.
    pub fn load_from(path: &Path) -> Self {
        Self::try_load_from(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid config, using defaults");
            Self::default()
        })
    }

    /// Load from `path`, writing defaults if it is missing. A file that
    /// exists but does not parse is an error.
    pub fn try_load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                if let Err(e) = cfg.save_to(path) {
                    tracing::warn!(error = %e, "could not write default config");
                }
                Ok(cfg)
            }
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Location of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be prepared.
    pub fn file_path() -> Result<PathBuf, ConfigError> {
        Self::path()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Call [`Config::save`] to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_LENGTH_MIN).contains(&self.session.length_min) {
            return Err(ConfigError::InvalidValue {
                key: "session.length_min".into(),
                message: format!("must be between 1 and {MAX_LENGTH_MIN} minutes"),
            });
        }
        if !self.advisor.endpoint.is_empty() {
            url::Url::parse(&self.advisor.endpoint).map_err(|e| ConfigError::InvalidValue {
                key: "advisor.endpoint".into(),
                message: e.to_string(),
            })?;
        }
        Ok(())
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
        assert_eq!(parsed.session.length_min, 30);
        assert_eq!(parsed.logging.level, "warn");
        assert!(parsed.advisor.endpoint.is_empty());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[session]\nlength_min = 25\n").unwrap();
        assert_eq!(parsed.session.length_min, 25);
        assert_eq!(parsed.advisor.timeout_secs, 20);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.length_min").as_deref(), Some("30"));
        assert_eq!(cfg.get("logging.level").as_deref(), Some("warn"));
        assert!(cfg.get("session.missing").is_none());
        assert!(cfg.get("session").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("session.length_min", "25").unwrap();
        cfg.set("advisor.endpoint", "https://example.com/api/analyze-task")
            .unwrap();
        assert_eq!(cfg.session.length(), Duration::minutes(25));
        assert_eq!(cfg.advisor.endpoint, "https://example.com/api/analyze-task");
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("session.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("session.length_min", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("session.length_min", "0").is_err());
        assert!(cfg.set("session.length_min", "1441").is_err());
        assert!(cfg.set("advisor.endpoint", "not a url").is_err());
        assert!(cfg.set("session", "1").is_err());
        assert_eq!(cfg.session.length_min, 30);
    }

    #[test]
    fn try_load_from_reports_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert_eq!(Config::try_load_from(&path).unwrap().session.length_min, 30);
        assert!(path.exists());

        std::fs::write(&path, "[session\nlength_min = 5").unwrap();
        let err = Config::try_load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed { ref path, .. } if path.ends_with("config.toml")));
    }

    #[test]
    fn load_from_writes_defaults_and_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path);
        assert_eq!(cfg.session.length_min, 30);
        assert!(path.exists());

        std::fs::write(&path, "session = [[[").unwrap();
        let cfg = Config::load_from(&path);
        assert_eq!(cfg.session.length_min, 30);
    }
}
