//! Stub backends for unit tests

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use tokio::sync::Semaphore;

use super::backend::{EngineBackend, Transcriber};
use crate::config::EngineConfig;

/// Loads instantly; jobs succeed immediately
pub struct ImmediateBackend;

impl EngineBackend for ImmediateBackend {
    fn load(&self, _config: &EngineConfig) -> Result<Arc<dyn Transcriber>> {
        Ok(Arc::new(Outcome(JobBehavior::Succeed, None)))
    }
}

/// Never loads
pub struct FailingBackend;

impl EngineBackend for FailingBackend {
    fn load(&self, _config: &EngineConfig) -> Result<Arc<dyn Transcriber>> {
        Err(anyhow!("no device"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobBehavior {
    Succeed,
    Fail,
    Panic,
}

/// Jobs block until the test releases the gate
#[derive(Clone)]
pub struct GatedBackend {
    pub gate: Arc<Semaphore>,
    pub loads: Arc<AtomicUsize>,
    behavior: JobBehavior,
}

impl GatedBackend {
    pub fn new(behavior: JobBehavior) -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            loads: Arc::new(AtomicUsize::new(0)),
            behavior,
        }
    }
}

impl EngineBackend for GatedBackend {
    fn load(&self, _config: &EngineConfig) -> Result<Arc<dyn Transcriber>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Outcome(self.behavior, Some(Arc::clone(&self.gate)))))
    }
}

struct Outcome(JobBehavior, Option<Arc<Semaphore>>);

impl Transcriber for Outcome {
    fn transcribe<'a>(&'a self, input: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if let Some(gate) = &self.1 {
                gate.acquire().await?.forget();
            }
            match self.0 {
                JobBehavior::Succeed => Ok(()),
                JobBehavior::Fail => Err(anyhow!("induced failure for {}", input.display())),
                JobBehavior::Panic => panic!("induced panic"),
            }
        })
    }
}
