//! Configuration loading utilities
//!
//! Provides helper functions for loading configuration from various sources
//! with proper error handling and validation.

use crate::{Result, config::Settings};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RIVIAN_CONFIG";

/// Directory name used under the platform config directory
pub const APP_DIR_NAME: &str = "rivian-telemetry";

/// Configuration loader with multiple source support
#[derive(Debug)]
pub struct ConfigLoader {
    /// Default settings
    defaults: Settings,
}

impl ConfigLoader {
    /// Create new configuration loader
    pub fn new() -> Self {
        Self {
            defaults: Settings::default(),
        }
    }

    /// Get the config file path from RIVIAN_CONFIG or the default location
    ///
    /// Priority:
    /// 1. RIVIAN_CONFIG environment variable
    /// 2. ~/.config/rivian-telemetry/config.toml (or platform equivalent)
    pub fn get_config_path() -> Option<PathBuf> {
        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(config_path);
            if path.exists() {
                debug!("Using config file from {}: {:?}", CONFIG_ENV_VAR, path);
                return Some(path);
            } else {
                // Runs before the subscriber exists, so report directly
                eprintln!(
                    "Warning: {} points to non-existent file: {}",
                    CONFIG_ENV_VAR,
                    path.display()
                );
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let default_path = config_dir.join(APP_DIR_NAME).join("config.toml");
            if default_path.exists() {
                debug!("Using default config file: {:?}", default_path);
                return Some(default_path);
            }
        }

        debug!("No config file found");
        None
    }

    /// Load configuration with precedence order:
    /// 1. Command line arguments (applied by the caller)
    /// 2. Environment variables
    /// 3. Configuration file
    /// 4. Default values
    pub fn load(&self, config_file: Option<&Path>) -> Result<Settings> {
        let mut settings = self.defaults.clone();

        if let Some(path) = config_file {
            if path.exists() {
                info!("Loading configuration from file: {:?}", path);
                settings = Settings::from_file(path)?;
            } else {
                eprintln!(
                    "Warning: configuration file not found: {}, using defaults",
                    path.display()
                );
            }
        }

        debug!("Applying environment variable overrides");
        settings = settings.merge_with_env()?;

        settings.validate()?;

        debug!("Final configuration: {:?}", settings);

        Ok(settings)
    }

    /// Load configuration from environment only
    pub fn from_env_only(&self) -> Result<Settings> {
        let settings = Settings::from_env()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Get default configuration
    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
