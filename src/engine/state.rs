//! Lifecycle state machine
//!
//! `ServiceState` is the single record describing the engine and its job.
//! Every mutation goes through one of the transition methods below; the
//! controller calls them with the state lock held.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::backend::{EngineBackend, EngineHandle, Transcriber};
use super::error::{ControlError, Result};
use crate::config::EngineConfig;

/// Declared lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loaded,
    /// A job is transcribing the given input
    Running(PathBuf),
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Unloaded => f.write_str("Unloaded"),
            ModelState::Loaded => f.write_str("Loaded"),
            ModelState::Running(path) => write!(f, "Running({})", path.display()),
        }
    }
}

/// The background job currently bound to the engine
#[derive(Debug)]
pub struct ActiveJob {
    pub id: Uuid,
    pub input_path: PathBuf,
    pub started_at: DateTime<Utc>,
    /// Supervisor task; never awaited by control operations
    pub(crate) task: JoinHandle<()>,
}

/// Result of a Load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    AlreadyLoaded,
}

impl LoadOutcome {
    pub fn message(self) -> &'static str {
        match self {
            LoadOutcome::Loaded => "model loaded",
            LoadOutcome::AlreadyLoaded => "already loaded",
        }
    }
}

/// Result of an Unload request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadOutcome {
    Unloaded,
    AlreadyUnloaded,
}

impl UnloadOutcome {
    pub fn message(self) -> &'static str {
        match self {
            UnloadOutcome::Unloaded => "model unloaded",
            UnloadOutcome::AlreadyUnloaded => "already unloaded",
        }
    }
}

/// Engine, job and declared state, kept consistent by the transitions
#[derive(Debug)]
pub struct ServiceState {
    pub(crate) state: ModelState,
    pub(crate) engine: Option<EngineHandle>,
    pub(crate) active_job: Option<ActiveJob>,
}

impl Default for ServiceState {
    fn default() -> Self {
        Self {
            state: ModelState::Unloaded,
            engine: None,
            active_job: None,
        }
    }
}

impl ServiceState {
    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn engine(&self) -> Option<&EngineHandle> {
        self.engine.as_ref()
    }

    pub fn active_job(&self) -> Option<&ActiveJob> {
        self.active_job.as_ref()
    }

    /// Unloaded -> Loaded, or a no-op when already loaded
    pub(crate) fn load(
        &mut self,
        backend: &dyn EngineBackend,
        config: &EngineConfig,
    ) -> Result<LoadOutcome> {
        match &self.state {
            ModelState::Running(path) => Err(ControlError::Busy(path.clone())),
            ModelState::Loaded => Ok(LoadOutcome::AlreadyLoaded),
            ModelState::Unloaded => {
                let engine = backend.load(config).map_err(ControlError::Load)?;
                self.engine = Some(EngineHandle::new(config.model_name(), engine));
                self.state = ModelState::Loaded;
                Ok(LoadOutcome::Loaded)
            }
        }
    }

    /// Loaded -> Unloaded, or a no-op when nothing is loaded
    pub(crate) fn unload(&mut self) -> Result<UnloadOutcome> {
        match &self.state {
            ModelState::Running(path) => Err(ControlError::Busy(path.clone())),
            ModelState::Unloaded => Ok(UnloadOutcome::AlreadyUnloaded),
            ModelState::Loaded => {
                self.engine = None;
                self.state = ModelState::Unloaded;
                Ok(UnloadOutcome::Unloaded)
            }
        }
    }

    /// Check the Start preconditions and hand out the engine for the worker
    ///
    /// Does not change state; [`ServiceState::start`] records the job once
    /// its task exists.
    pub(crate) fn prepare_start(&self, input: &Path) -> Result<Arc<dyn Transcriber>> {
        let engine = match (&self.state, &self.engine) {
            (ModelState::Unloaded, _) | (_, None) => return Err(ControlError::NotLoaded),
            (ModelState::Running(path), _) => return Err(ControlError::Busy(path.clone())),
            (ModelState::Loaded, Some(engine)) => engine.transcriber(),
        };
        validate_input(input)?;
        Ok(engine)
    }

    /// Loaded -> Running
    pub(crate) fn start(&mut self, job: ActiveJob) {
        debug_assert!(self.active_job.is_none());
        self.state = ModelState::Running(job.input_path.clone());
        self.active_job = Some(job);
    }

    /// Running -> Loaded when `job_id` is the active job
    ///
    /// Returns the finished job, or `None` if `job_id` is not active.
    pub(crate) fn complete(&mut self, job_id: Uuid) -> Option<ActiveJob> {
        if self.active_job.as_ref().map(|job| job.id) != Some(job_id) {
            return None;
        }
        let job = self.active_job.take();
        self.state = ModelState::Loaded;
        job
    }
}

/// An input must name something that exists; files must be readable
fn validate_input(input: &Path) -> Result<()> {
    if input.as_os_str().is_empty() {
        return Err(ControlError::InvalidPath("no path given".to_string()));
    }
    let metadata = std::fs::metadata(input)
        .map_err(|e| ControlError::InvalidPath(format!("{}: {}", input.display(), e)))?;
    if metadata.is_file() {
        std::fs::File::open(input)
            .map_err(|e| ControlError::InvalidPath(format!("{}: {}", input.display(), e)))?;
    }
    Ok(())
}
