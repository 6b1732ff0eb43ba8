//! Engine configuration settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Model used when running on a CUDA device and no model is configured
pub const DEFAULT_CUDA_MODEL: &str = "large-v2";
/// Model used on CPU when no model is configured
pub const DEFAULT_CPU_MODEL: &str = "small.en";

/// Device configuration for the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceConfig {
    /// Simple device string (e.g., "auto", "cuda:0", "cpu")
    Simple(String),
    /// Detailed device configuration
    Detailed {
        /// Device type: "cuda", "cpu"
        device_type: String,
        /// Device ID (for multi-GPU)
        #[serde(default)]
        device_id: usize,
    },
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig::Simple("auto".to_string())
    }
}

impl DeviceConfig {
    /// Get device type ("cuda", "cpu" or "auto")
    pub fn device_type(&self) -> &str {
        match self {
            DeviceConfig::Simple(s) => {
                if s.starts_with("cuda") {
                    "cuda"
                } else if s == "auto" {
                    "auto"
                } else {
                    "cpu"
                }
            }
            DeviceConfig::Detailed { device_type, .. } => device_type,
        }
    }

    /// Get device ID (for multi-GPU)
    pub fn device_id(&self) -> usize {
        match self {
            DeviceConfig::Simple(s) => s
                .strip_prefix("cuda:")
                .and_then(|id| id.parse().ok())
                .unwrap_or(0),
            DeviceConfig::Detailed { device_id, .. } => *device_id,
        }
    }

    /// Check if using CUDA
    pub fn is_cuda(&self) -> bool {
        self.device_type() == "cuda"
    }

    /// Replace "auto" with a concrete device
    pub fn resolve(&self) -> DeviceConfig {
        if self.device_type() != "auto" {
            return self.clone();
        }
        if cuda_available() {
            DeviceConfig::Simple("cuda".to_string())
        } else {
            DeviceConfig::Simple("cpu".to_string())
        }
    }
}

/// Probe for the NVIDIA driver's control device
fn cuda_available() -> bool {
    Path::new("/dev/nvidiactl").exists() || Path::new("/proc/driver/nvidia/version").exists()
}

/// Engine settings, fixed once the service starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Model name; defaults depend on the resolved device
    #[serde(default)]
    pub model: Option<String>,

    /// Device configuration
    #[serde(default)]
    pub device: DeviceConfig,

    /// Spoken language of the input
    #[serde(default = "default_language")]
    pub language: String,

    /// Program invoked by the command backend
    #[serde(default = "default_command")]
    pub command: String,

    /// Where the backend writes transcripts (backend default if unset)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Extra arguments appended to every backend invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_command() -> String {
    "whisperx".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: None,
            device: DeviceConfig::default(),
            language: default_language(),
            command: default_command(),
            output_dir: None,
            extra_args: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Model name, falling back to the per-device default
    pub fn model_name(&self) -> &str {
        match self.model.as_deref() {
            Some(name) => name,
            None if self.device.is_cuda() => DEFAULT_CUDA_MODEL,
            None => DEFAULT_CPU_MODEL,
        }
    }

    /// Resolve the device and pin the model name
    pub fn resolved(mut self) -> Self {
        self.device = self.device.resolve();
        self.model = Some(self.model_name().to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_parsing() {
        let cuda = DeviceConfig::Simple("cuda:1".to_string());
        assert!(cuda.is_cuda());
        assert_eq!(cuda.device_id(), 1);

        let cpu = DeviceConfig::Simple("cpu".to_string());
        assert!(!cpu.is_cuda());
        assert_eq!(cpu.device_id(), 0);
    }

    #[test]
    fn test_auto_device_resolves_to_concrete() {
        let resolved = DeviceConfig::default().resolve();
        assert_ne!(resolved.device_type(), "auto");
    }

    #[test]
    fn test_default_model_follows_device() {
        let mut config = EngineConfig {
            device: DeviceConfig::Simple("cpu".to_string()),
            ..Default::default()
        };
        assert_eq!(config.model_name(), DEFAULT_CPU_MODEL);

        config.device = DeviceConfig::Detailed {
            device_type: "cuda".to_string(),
            device_id: 0,
        };
        assert_eq!(config.model_name(), DEFAULT_CUDA_MODEL);

        config.model = Some("medium".to_string());
        assert_eq!(config.model_name(), "medium");
    }

    #[test]
    fn test_resolved_pins_model() {
        let config = EngineConfig::default().resolved();
        assert!(config.model.is_some());
        assert_ne!(config.device.device_type(), "auto");
    }
}
