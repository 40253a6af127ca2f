// Editor configuration - history and pool sizes, channel capacities
//
// Supplied once at startup (JSON from the host page, or a RON file for the
// desktop demo) and read-only afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    RonWrite(#[from] ron::Error),
}

/// Bounds of an object pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Instances built up front
    pub min: usize,
    /// Hard cap on live instances
    pub max: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { min: 10, max: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo history length
    pub max_operations: usize,
    pub particle_pool: PoolConfig,
    pub oscillator_pool: PoolConfig,
    pub event_channel_capacity: usize,
    pub notification_channel_capacity: usize,
    /// Root for the file transport; platform data dir when unset
    pub storage_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_operations: 100,
            particle_pool: PoolConfig::default(),
            oscillator_pool: PoolConfig::default(),
            event_channel_capacity: 256,
            notification_channel_capacity: 64,
            storage_dir: None,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = ron::from_str(&text)?;
        config.validate()?;
        log::info!("Loaded editor config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_operations == 0 {
            return Err(ConfigError::Invalid(
                "max_operations must be at least 1".to_string(),
            ));
        }
        for (name, pool) in [
            ("particle_pool", self.particle_pool),
            ("oscillator_pool", self.oscillator_pool),
        ] {
            if pool.max == 0 {
                return Err(ConfigError::Invalid(format!("{}.max must be at least 1", name)));
            }
            if pool.min > pool.max {
                return Err(ConfigError::Invalid(format!(
                    "{}.min ({}) exceeds max ({})",
                    name, pool.min, pool.max
                )));
            }
        }
        if self.event_channel_capacity == 0 || self.notification_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel capacities must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
