use crate::stations::{StationFactory, DEFAULT_ZENTRA_MAX_RETRIES};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde_derive::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.as_str()).unwrap_or(tracing::Level::INFO)
    }
}

pub fn load_app_config() -> Result<AppConfig> {
    match envy::from_env::<AppConfig>() {
        Ok(config) => Ok(config),
        Err(err) => Err(anyhow!("Failed to load AppConfig: {}", err)),
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("../weatherdata")
}

fn default_zentra_max_retries() -> u32 {
    DEFAULT_ZENTRA_MAX_RETRIES
}

#[derive(Deserialize, Debug)]
pub struct CollectorConfig {
    /// Station table to load.
    pub stations_file: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_zentra_max_retries")]
    pub zentra_max_retries: u32,
    // RFC 3339; each station's default window is used when both are absent
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl CollectorConfig {
    pub fn station_factory(&self) -> StationFactory {
        StationFactory::new().with_zentra_max_retries(self.zentra_max_retries)
    }
}

pub fn load_collector_config() -> Result<CollectorConfig> {
    match envy::prefixed("PWS_").from_env::<CollectorConfig>() {
        Ok(config) => Ok(config),
        Err(err) => Err(anyhow!("Failed to load CollectorConfig: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serial_test::serial;
    use std::env::VarError;

    const COLLECTOR_VARS: [&str; 5] = [
        "PWS_STATIONS_FILE",
        "PWS_OUTPUT_DIR",
        "PWS_ZENTRA_MAX_RETRIES",
        "PWS_START",
        "PWS_END",
    ];

    /// Helper to temporarily set environment variables and restore them after
    fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let originals: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
            .collect();
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        let result = f();
        for (key, original) in originals {
            match original {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }
        result
    }

    /// Helper to temporarily clear environment variables and restore them after
    fn without_env_vars<F, R>(keys: &[&str], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let originals: Vec<(String, Result<String, VarError>)> = keys
            .iter()
            .map(|&key| (key.to_string(), std::env::var(key)))
            .collect();

        for key in keys {
            std::env::remove_var(key);
        }

        let result = f();

        for (key, original) in originals {
            match original {
                Ok(val) => std::env::set_var(&key, val),
                Err(_) => std::env::remove_var(&key),
            }
        }

        result
    }

    #[test]
    #[serial]
    fn test_load_app_config() {
        with_env_vars(&[("LOG_LEVEL", "debug")], || {
            let config = load_app_config().unwrap();
            assert_eq!(config.log_level, "debug");
            assert_eq!(config.log_level(), tracing::Level::DEBUG);
        });
    }

    #[test]
    #[serial]
    fn test_load_app_config_missing() {
        without_env_vars(&["LOG_LEVEL"], || {
            let config = load_app_config().unwrap();
            assert_eq!(config.log_level, "info");
        });
    }

    #[test]
    #[serial]
    fn test_unknown_log_level_falls_back_to_info() {
        with_env_vars(&[("LOG_LEVEL", "chatty")], || {
            assert_eq!(load_app_config().unwrap().log_level(), tracing::Level::INFO);
        });
    }

    #[test]
    #[serial]
    fn test_load_collector_config() {
        without_env_vars(&COLLECTOR_VARS, || {
            with_env_vars(
                &[
                    ("PWS_STATIONS_FILE", "/etc/pws/stations.csv"),
                    ("PWS_OUTPUT_DIR", "/var/lib/pws"),
                    ("PWS_ZENTRA_MAX_RETRIES", "5"),
                    ("PWS_START", "2023-06-01T12:00:00Z"),
                    ("PWS_END", "2023-06-01T12:15:00Z"),
                ],
                || {
                    let config = load_collector_config().unwrap();
                    assert_eq!(config.stations_file, PathBuf::from("/etc/pws/stations.csv"));
                    assert_eq!(config.output_dir, PathBuf::from("/var/lib/pws"));
                    assert_eq!(config.zentra_max_retries, 5);
                    assert_eq!(config.station_factory().zentra_max_retries(), 5);
                    assert_eq!(
                        config.start,
                        Some(Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap())
                    );
                    assert_eq!(
                        config.end,
                        Some(Utc.with_ymd_and_hms(2023, 6, 1, 12, 15, 0).unwrap())
                    );
                },
            )
        });
    }

    #[test]
    #[serial]
    fn test_load_collector_config_defaults() {
        without_env_vars(&COLLECTOR_VARS, || {
            with_env_vars(&[("PWS_STATIONS_FILE", "stations.csv")], || {
                let config = load_collector_config().unwrap();
                assert_eq!(config.output_dir, PathBuf::from("../weatherdata"));
                assert_eq!(config.zentra_max_retries, 3);
                assert!(config.start.is_none());
                assert!(config.end.is_none());
            })
        });
    }

    #[test]
    #[serial]
    fn test_load_collector_config_missing() {
        without_env_vars(&COLLECTOR_VARS, || {
            let err = load_collector_config().unwrap_err();
            assert!(err.to_string().contains("Failed to load CollectorConfig"));
        });
    }

    #[test]
    #[serial]
    fn test_load_collector_config_bad_start() {
        without_env_vars(&COLLECTOR_VARS, || {
            with_env_vars(
                &[("PWS_STATIONS_FILE", "stations.csv"), ("PWS_START", "yesterday")],
                || assert!(load_collector_config().is_err()),
            )
        });
    }
}
