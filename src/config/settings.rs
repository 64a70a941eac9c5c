//! Persisted application configuration

use super::defaults::build_default_widgets;
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use vitals_hud_core::NativeSource;
use vitals_hud_types::AppConfig;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Per-user config directory (`~/.config/vitals-hud` on Linux)
pub fn default_config_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "github.vitals_hud", "vitals-hud")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(dirs.config_dir().to_path_buf())
}

/// Owns `config.json` and the in-memory copy of it
///
/// Writers go to disk first and only replace the in-memory copy once the
/// file is written, so a failed save leaves both untouched.
pub struct ConfigService {
    path: PathBuf,
    config: RwLock<AppConfig>,
}

impl ConfigService {
    /// Open the config in `config_dir`, creating it from defaults if missing
    ///
    /// A file that exists but cannot be parsed is left alone; the service
    /// runs on defaults until the next save.
    pub fn new(config_dir: &Path, natives: &[NativeSource]) -> Self {
        let defaults = AppConfig {
            widgets: build_default_widgets(natives),
            ..Default::default()
        };
        let service = Self::with_config(config_dir.join(CONFIG_FILE_NAME), defaults);

        match service.load() {
            Ok(()) => {
                log::info!("Loaded config from {}", service.path.display());
            }
            Err(e) if is_not_found(&e) => {
                log::info!(
                    "No config at {}, writing defaults",
                    service.path.display()
                );
                if let Err(e) = service.save() {
                    log::warn!("Failed to write default config: {:#}", e);
                }
            }
            Err(e) => {
                log::error!("Failed to load config, using defaults: {:#}", e);
            }
        }
        service
    }

    /// Service over an explicit path and starting config, without touching disk
    pub fn with_config(path: PathBuf, config: AppConfig) -> Self {
        Self {
            path,
            config: RwLock::new(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory config with the file contents
    pub fn load(&self) -> Result<()> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    /// Write the in-memory config to disk
    pub fn save(&self) -> Result<()> {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        self.write_file(&config)
    }

    /// Snapshot of the current config with global settings normalized
    pub fn get_config(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .with_defaults()
    }

    /// Persist `config` and make it current
    pub fn update_config(&self, config: AppConfig) -> Result<()> {
        // Held across the write so concurrent updates land in order
        let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
        self.write_file(&config)?;
        *current = config;
        Ok(())
    }

    fn write_file(&self, config: &AppConfig) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == ErrorKind::NotFound)
}
