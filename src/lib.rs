//! Scribe - control service for a single transcription engine
//!
//! Scribe owns one heavyweight inference engine and runs at most one
//! transcription job against it at a time.
//!
//! # Architecture
//!
//! - **engine**: state machine, request guard, job controller, backends
//! - **server**: HTTP control API with auth and invariant interceptors
//! - **cli**: `serve`, `transcribe` and `info` commands
//!
//! # Example
//!
//! ```bash
//! # Start the control server on port 8080
//! scribe serve 8080 my-secret
//!
//! curl -X POST -H 'Authorization: my-secret' localhost:8080/load_model
//! curl -X POST -H 'Authorization: my-secret' \
//!      -H 'Content-Type: application/json' \
//!      -d '{"path": "/data/talk.wav"}' localhost:8080/start_transcribe
//! curl localhost:8080/status
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod server;

// Re-export key types
pub use config::{EngineConfig, ScribeConfig, ServerConfig};
pub use engine::{Controller, ModelState};
