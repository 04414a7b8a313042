use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::{
    core::{catalog::CatalogStore, history::HistoryWatcher, runtime::CoreRuntimeConfig},
    protocol::{acquisition::AcquisitionLimits, LinkSettings},
};

/// Console configuration, read from TOML. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Engine catalog file
    pub engine_file: PathBuf,
    /// Propeller catalog file
    pub propeller_file: PathBuf,
    /// Test history log
    pub history_file: PathBuf,
    pub baud_rate: u32,
    /// Read timeout for every exchange, in milliseconds
    pub read_timeout_ms: u64,
    /// History check interval in milliseconds
    pub poll_interval_ms: u64,
    /// Upper bound for samples collected during one run
    pub max_samples: usize,
    /// Entries kept in the status backlog
    pub status_log_capacity: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            engine_file: PathBuf::from("engines.txt"),
            propeller_file: PathBuf::from("propellers.txt"),
            history_file: PathBuf::from("test_history.txt"),
            baud_rate: 9600,
            read_timeout_ms: 2000,
            poll_interval_ms: 5000,
            max_samples: 10_000,
            status_log_capacity: 200,
        }
    }
}

impl ConsoleConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    pub fn from_file(file_path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {file_path}"))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config file {file_path}"))
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                let config = Self::from_file(path)?;
                log::info!("Loaded config from {path}");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            baud: self.baud_rate,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }

    pub fn acquisition_limits(&self) -> AcquisitionLimits {
        AcquisitionLimits {
            max_samples: self.max_samples,
        }
    }

    pub fn runtime_config(&self) -> CoreRuntimeConfig {
        CoreRuntimeConfig {
            history_interval: Duration::from_millis(self.poll_interval_ms),
            acquisition: self.acquisition_limits(),
        }
    }

    pub fn catalog_store(&self) -> CatalogStore {
        CatalogStore::new(&self.engine_file, &self.propeller_file)
    }

    pub fn history_watcher(&self) -> HistoryWatcher {
        HistoryWatcher::new(&self.history_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config = ConsoleConfig::from_toml("").unwrap();
        assert_eq!(config, ConsoleConfig::default());
        let link = config.link_settings();
        assert_eq!(link.baud, 9600);
        assert_eq!(link.read_timeout, Duration::from_secs(2));
        assert_eq!(
            config.runtime_config().history_interval,
            Duration::from_millis(5000)
        );
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let config = ConsoleConfig::from_toml(
            r#"
            history_file = "/var/lib/bench/history.txt"
            baud_rate = 115200
            "#,
        )
        .unwrap();
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.history_file, PathBuf::from("/var/lib/bench/history.txt"));
        assert_eq!(config.engine_file, PathBuf::from("engines.txt"));
        assert_eq!(config.read_timeout_ms, 2000);
    }

    #[test]
    fn rendered_config_parses_back() {
        let config = ConsoleConfig {
            max_samples: 42,
            ..Default::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(ConsoleConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(ConsoleConfig::from_toml("baud_rate = \"fast\"").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("propbench_{}.toml", uuid::Uuid::new_v4()));
        assert!(ConsoleConfig::load(path.to_str()).is_err());
        assert_eq!(ConsoleConfig::load(None).unwrap(), ConsoleConfig::default());
    }
}
