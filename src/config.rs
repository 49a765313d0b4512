// YAML configuration for the command-line front end

use crate::store::{DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, StoreOptions};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted task list
    pub data_dir: PathBuf,
    pub priorities: bool,
    pub backfill: bool,
    pub date_format: String,
    pub time_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            priorities: true,
            backfill: true,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing file yields the defaults. A file that exists but does not
    /// parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        if !path.exists() {
            debug!(file = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!(file = ?path, "Loaded config");
        Ok(config)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            priorities: self.priorities,
            backfill: self.backfill,
            date_format: self.date_format.clone(),
            time_format: self.time_format.clone(),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("todostore")
        .join("config.yaml")
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("todostore")
}
