//! Persistent tool configuration.
//!
//! Stored as pretty JSON in `~/.cmd_config/config.json` by default. A missing
//! file means "use defaults"; nothing is written until `save_config`.

use std::path::{Path, PathBuf};

use cmd_client::UpstreamConfig;
use cmd_core::{IsochroneParams, PlotDomain, PlotFrame, Viewport};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.json";

/// Where services are reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Proxy server base URL; services are queried directly when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(flatten)]
    pub upstream: UpstreamConfig,
}

/// Plot geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub domain: PlotDomain,
    pub viewport: Viewport,
}

impl PlotConfig {
    pub fn frame(&self) -> PlotFrame {
        PlotFrame::new(self.domain, self.viewport)
    }
}

/// Everything stored in `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub services: ServicesConfig,
    pub plot: PlotConfig,
    /// Isochrone selection applied after every fetch
    pub isochrone: IsochroneParams,
}

/// Configuration storage manager.
#[derive(Debug, Clone)]
pub struct ConfigStorage {
    /// Root directory for all configuration (e.g., ~/.cmd_config)
    root_path: PathBuf,
}

impl ConfigStorage {
    /// Create a new config storage with default path (~/.cmd_config)
    pub fn new() -> std::io::Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
        let root_path = PathBuf::from(home).join(".cmd_config");
        Ok(Self { root_path })
    }

    /// Create a new config storage with custom root path
    pub fn with_path(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn config_path(&self) -> PathBuf {
        self.root_path.join(CONFIG_FILE)
    }

    /// Get the stored configuration.
    ///
    /// Returns None if no configuration has been saved.
    /// Returns Some(Err) if the file exists but cannot be loaded.
    pub fn get_config(&self) -> Option<std::io::Result<ToolConfig>> {
        let path = self.config_path();

        if !path.exists() {
            return None;
        }

        Some(std::fs::read_to_string(&path).and_then(|json| {
            serde_json::from_str(&json)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        }))
    }

    /// Stored configuration, falling back to defaults when absent or unreadable.
    pub fn load_or_default(&self) -> ToolConfig {
        match self.get_config() {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                log::warn!(
                    "Ignoring unreadable config {}: {}",
                    self.config_path().display(),
                    e
                );
                ToolConfig::default()
            }
            None => ToolConfig::default(),
        }
    }

    /// Save the configuration.
    ///
    /// Creates the config directory if it doesn't exist.
    /// Returns the path where the configuration was saved.
    pub fn save_config(&self, config: &ToolConfig) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.root_path)?;

        let path = self.config_path();
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Delete the stored configuration.
    ///
    /// Returns Ok(true) if the file was deleted, Ok(false) if it didn't exist.
    pub fn delete_config(&self) -> std::io::Result<bool> {
        let path = self.config_path();

        if !path.exists() {
            return Ok(false);
        }

        std::fs::remove_file(path)?;
        Ok(true)
    }
}
