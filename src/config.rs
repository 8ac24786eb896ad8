//! Runtime configuration: optional YAML file, then environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::battle::{RotationLimits, DEFAULT_MAX_EVENTS, DEFAULT_MAX_ROUNDS};
use crate::registry::{CorruptStatePolicy, DEFAULT_DATA_FILE};

pub const DEFAULT_CONFIG_PATH: &str = "shinobi.yaml";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub bind_addr: String,
    pub data_file: PathBuf,
    pub corrupt_state: CorruptStatePolicy,
    /// Largest terminal round a rotation request may project to.
    pub max_rounds: u64,
    /// Largest number of hits (rounds times hits per rotation) a request may log.
    pub max_events: u64,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            corrupt_state: CorruptStatePolicy::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_events: DEFAULT_MAX_EVENTS,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// `$SHINOBI_CONFIG` if set (must exist), else `shinobi.yaml` when present,
    /// else defaults; environment overrides apply last.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match env::var("SHINOBI_CONFIG") {
            Ok(path) => Self::from_yaml_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_yaml_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            Err(_) => Self::default(),
        };
        base.with_env_overrides(|key| env::var(key).ok())
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn rotation_limits(&self) -> RotationLimits {
        RotationLimits {
            max_rounds: self.max_rounds,
            max_events: self.max_events,
        }
    }

    /// Apply `SHINOBI_*` overrides read through `lookup`.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(bind) = lookup("SHINOBI_BIND") {
            self.bind_addr = bind;
        }
        if let Some(path) = lookup("SHINOBI_DATA_FILE") {
            self.data_file = PathBuf::from(path);
        }
        if let Some(raw) = lookup("SHINOBI_MAX_ROUNDS") {
            self.max_rounds = parse_limit("SHINOBI_MAX_ROUNDS", &raw)?;
        }
        if let Some(raw) = lookup("SHINOBI_MAX_EVENTS") {
            self.max_events = parse_limit("SHINOBI_MAX_EVENTS", &raw)?;
        }
        if let Some(raw) = lookup("SHINOBI_CORRUPT_STATE") {
            self.corrupt_state =
                CorruptStatePolicy::parse(&raw).ok_or(ConfigError::InvalidEnv {
                    key: "SHINOBI_CORRUPT_STATE",
                    value: raw.clone(),
                })?;
        }
        Ok(self)
    }
}

fn parse_limit(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| ConfigError::InvalidEnv {
            key,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn yaml_overrides_defaults_field_by_field() {
        let config = Config::from_yaml_str("data_file: data/ninjas.json\ncorrupt_state: fail\n")
            .expect("valid yaml");
        assert_eq!(config.data_file, PathBuf::from("data/ninjas.json"));
        assert_eq!(config.corrupt_state, CorruptStatePolicy::Fail);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.max_rounds, DEFAULT_MAX_ROUNDS);
        assert_eq!(config.max_events, DEFAULT_MAX_EVENTS);
    }

    #[test]
    fn unknown_yaml_keys_are_rejected() {
        assert!(Config::from_yaml_str("bind: 0.0.0.0:80\n").is_err());
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(Config::from_yaml_str("").expect("empty"), Config::default());
    }

    #[test]
    fn env_overrides_apply_last() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SHINOBI_BIND", "0.0.0.0:8080"),
            ("SHINOBI_MAX_ROUNDS", "50"),
            ("SHINOBI_MAX_EVENTS", "2500"),
            ("SHINOBI_CORRUPT_STATE", "fail"),
        ]);
        let config = Config::default()
            .with_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .expect("valid overrides");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(
            config.rotation_limits(),
            RotationLimits {
                max_rounds: 50,
                max_events: 2500
            }
        );
        assert_eq!(config.corrupt_state, CorruptStatePolicy::Fail);
        assert_eq!(config.data_file, PathBuf::from(DEFAULT_DATA_FILE));
    }

    #[test]
    fn invalid_env_values_are_errors() {
        let err = Config::default()
            .with_env_overrides(|key| (key == "SHINOBI_MAX_ROUNDS").then(|| "zero".to_string()))
            .expect_err("should reject");
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                key: "SHINOBI_MAX_ROUNDS",
                ..
            }
        ));

        let err = Config::default()
            .with_env_overrides(|key| (key == "SHINOBI_MAX_EVENTS").then(|| "0".to_string()))
            .expect_err("should reject");
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                key: "SHINOBI_MAX_EVENTS",
                ..
            }
        ));
    }

    #[test]
    fn yaml_sets_event_limit() {
        let config = Config::from_yaml_str("max_events: 500\n").expect("valid yaml");
        assert_eq!(config.max_events, 500);
        assert_eq!(config.max_rounds, DEFAULT_MAX_ROUNDS);
    }
}
