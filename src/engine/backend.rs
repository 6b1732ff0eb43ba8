//! Engine backend abstraction
//!
//! The controller never looks inside a loaded engine. It asks an
//! [`EngineBackend`] for one, keeps it behind an [`EngineHandle`], and
//! hands a reference to the job worker when a transcription starts.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::config::EngineConfig;

/// A loaded inference resource able to process one input
pub trait Transcriber: Send + Sync {
    /// Transcribe the input at `input`
    ///
    /// May run for an unbounded amount of time. Results are the backend's
    /// business; only success or failure is reported back.
    fn transcribe<'a>(&'a self, input: &'a Path) -> BoxFuture<'a, Result<()>>;
}

/// Factory for loaded engines
pub trait EngineBackend: Send + Sync {
    /// Allocate the engine described by `config`
    fn load(&self, config: &EngineConfig) -> Result<Arc<dyn Transcriber>>;
}

/// Opaque handle to a loaded engine
///
/// Created by Load and dropped by Unload. Only the controller holds one.
pub struct EngineHandle {
    id: Uuid,
    model_name: String,
    engine: Arc<dyn Transcriber>,
}

impl EngineHandle {
    pub(crate) fn new(model_name: impl Into<String>, engine: Arc<dyn Transcriber>) -> Self {
        Self {
            id: Uuid::new_v4(),
            model_name: model_name.into(),
            engine,
        }
    }

    /// Identity of this allocation; a reload produces a new id
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub(crate) fn transcriber(&self) -> Arc<dyn Transcriber> {
        Arc::clone(&self.engine)
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("id", &self.id)
            .field("model_name", &self.model_name)
            .finish_non_exhaustive()
    }
}
