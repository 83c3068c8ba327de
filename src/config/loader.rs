use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::system::{FileSystemInterface, StandardFileSystem};

use super::types::{Config, config_dir};

/// Reads and writes the TOML configuration through an injected file system
pub struct ConfigLoader<F: FileSystemInterface> {
    file_system: F,
    config_path: PathBuf,
}

impl<F: FileSystemInterface> ConfigLoader<F> {
    pub fn new(file_system: F, config_path: PathBuf) -> Self {
        Self {
            file_system,
            config_path,
        }
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration. A missing file is replaced by the defaults,
    /// written back when the directory allows it.
    pub fn load_config(&self) -> Result<Config> {
        if self.file_system.file_exists(&self.config_path) {
            return self.parse_file();
        }

        info!(
            "No configuration at {}, using defaults",
            self.config_path.display()
        );
        let config = Config::default();
        if let Err(e) = self.save_config(&config) {
            warn!("Default configuration not written: {:#}", e);
        }
        Ok(config)
    }

    /// Re-read the file, e.g. on SIGHUP. Returns the new configuration only
    /// when it differs from `current`; a deleted file keeps `current`.
    pub fn reload_config(&self, current: &Config) -> Result<Option<Config>> {
        if !self.file_system.file_exists(&self.config_path) {
            warn!(
                "Configuration {} disappeared, keeping the loaded settings",
                self.config_path.display()
            );
            return Ok(None);
        }

        let reloaded = self.parse_file()?;
        if &reloaded == current {
            debug!("Configuration unchanged");
            return Ok(None);
        }

        info!("Configuration changed: {}", self.config_path.display());
        Ok(Some(reloaded))
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        let path = &self.config_path;
        if let Some(parent) = path.parent() {
            self.file_system
                .create_dir(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
        self.file_system
            .write_file(path, &content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    fn parse_file(&self) -> Result<Config> {
        let path = &self.config_path;
        debug!("Reading configuration from {}", path.display());

        let content = self
            .file_system
            .read_file(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
    }
}

impl ConfigLoader<StandardFileSystem> {
    /// Production loader for `path`, or `~/.config/media-device-select/config.toml`
    pub fn for_path(config_path: Option<&str>) -> Result<Self> {
        let path = match config_path {
            Some(path) => PathBuf::from(path),
            None => config_dir()?.join("config.toml"),
        };
        Ok(Self::new(StandardFileSystem, path))
    }
}
