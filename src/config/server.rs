//! Server configuration settings

use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Shared secret expected in the `Authorization` header
    #[serde(default)]
    pub api_key: String,

    /// Delay between acknowledging `/stop` and shutting the listener down
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_shutdown_grace_ms() -> u64 {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            api_key: String::new(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("an API key is required");
        }
        if self.port == 0 {
            bail!("port must be non-zero");
        }
        Ok(())
    }
}
