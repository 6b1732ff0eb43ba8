//! Configuration system for scribe
//!
//! ScribeConfig groups the engine settings (fixed for the life of the
//! process) and the HTTP server settings.

mod engine;
mod server;

pub use engine::{DeviceConfig, EngineConfig, DEFAULT_CPU_MODEL, DEFAULT_CUDA_MODEL};
pub use server::ServerConfig;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Scribe configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScribeConfig {
    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Server settings (only for `scribe serve`)
    #[serde(default)]
    pub server: ServerConfig,
}

impl ScribeConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from a file, picking the format by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            _ => Self::from_yaml(path),
        };
        config.with_context(|| format!("failed to read config {}", path.display()))
    }

    /// Load from an optional file, or start from defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides for the engine settings
    pub fn override_engine(
        &mut self,
        model: Option<String>,
        device: Option<String>,
        language: Option<String>,
    ) {
        if let Some(model) = model {
            self.engine.model = Some(model);
        }
        if let Some(device) = device {
            self.engine.device = DeviceConfig::Simple(device);
        }
        if let Some(language) = language {
            self.engine.language = language;
        }
    }
}
