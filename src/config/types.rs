use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub inventory: InventoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Also write daily-rotated log files
    #[serde(default)]
    pub log_to_file: bool,

    /// Log directory; defaults to ~/.local/share/media-device-select/logs
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotated log files older than this many days are removed at startup
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Preference file; defaults to ~/.config/media-device-select/preferences.toml
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,

    /// Prepended to every preference key, for stores written by other hosts
    #[serde(default)]
    pub key_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Device inventory file; defaults to ~/.config/media-device-select/devices.toml
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_retention_days() -> u64 {
    7
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_to_file: false,
            log_dir: None,
            log_retention_days: default_log_retention_days(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Directory holding the config, preference and inventory files
pub fn config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home_dir.join(".config/media-device-select"))
}

impl Config {
    pub fn preferences_path(&self) -> Result<PathBuf> {
        match &self.storage.preferences_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("preferences.toml")),
        }
    }

    pub fn inventory_path(&self) -> Result<PathBuf> {
        match &self.inventory.path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("devices.toml")),
        }
    }
}
