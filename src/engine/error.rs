//! Controller error types

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors raised by control operations on the engine lifecycle
#[derive(Debug, Error)]
pub enum ControlError {
    /// Start requested while no engine is loaded
    #[error("model not loaded")]
    NotLoaded,

    /// A job is already active; carries its input path
    #[error("already transcribing {}", .0.display())]
    Busy(PathBuf),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// State record is inconsistent with the engine/job it owns
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("failed to load engine: {0:#}")]
    Load(anyhow::Error),
}

impl ControlError {
    /// Whether the error was caused by the request rather than by the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ControlError::NotLoaded | ControlError::Busy(_) | ControlError::InvalidPath(_)
        )
    }
}
