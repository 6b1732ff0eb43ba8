//! Engine lifecycle core
//!
//! - Backend: opaque engine handle and the traits that produce it
//! - State: the Unloaded / Loaded / Running state machine
//! - Guard: consistency check run before every control operation
//! - Controller: owns the state and the single background job

mod backend;
mod command;
mod controller;
mod error;
mod guard;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{EngineBackend, Transcriber};
pub use command::CommandBackend;
pub use controller::{Controller, JobInfo, JobReport, StatusSnapshot};
pub use error::{ControlError, Result};
pub use state::{LoadOutcome, ModelState, UnloadOutcome};
