//! Job controller
//!
//! Owns the [`ServiceState`] behind one async mutex. Control operations
//! lock, check the guard, apply a transition and publish the new state.
//! A started job runs in its own task; a supervisor task waits for it and
//! applies the completion transition under the same lock.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use super::backend::EngineBackend;
use super::error::Result;
use super::guard;
use super::state::{ActiveJob, LoadOutcome, ModelState, ServiceState, UnloadOutcome};
use crate::config::EngineConfig;

/// Point-in-time view of the service for status reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: ModelState,
    pub job: Option<JobInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub id: Uuid,
    pub input_path: PathBuf,
    pub started_at: DateTime<Utc>,
}

/// Outcome of a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub id: Uuid,
    pub input_path: PathBuf,
    pub elapsed_ms: u64,
    /// Failure reason; `None` when the job succeeded
    pub error: Option<String>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Controller for the single engine and its single job
pub struct Controller {
    config: EngineConfig,
    backend: Box<dyn EngineBackend>,
    state: Mutex<ServiceState>,
    state_tx: watch::Sender<ModelState>,
    report_tx: watch::Sender<Option<JobReport>>,
}

impl Controller {
    /// Create a controller in the `Unloaded` state
    pub fn new(config: EngineConfig, backend: impl EngineBackend + 'static) -> Self {
        let (state_tx, _) = watch::channel(ModelState::Unloaded);
        let (report_tx, _) = watch::channel(None);
        Self {
            config,
            backend: Box::new(backend),
            state: Mutex::new(ServiceState::default()),
            state_tx,
            report_tx,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Follow state changes
    pub fn subscribe(&self) -> watch::Receiver<ModelState> {
        self.state_tx.subscribe()
    }

    /// Wait for job `id` to finish and return its outcome
    ///
    /// Resolves immediately if `id` was the most recently finished job. Only
    /// the latest report is kept, so call this before starting another job.
    pub async fn job_report(&self, id: Uuid) -> Option<JobReport> {
        let mut reports = self.report_tx.subscribe();
        let report = reports
            .wait_for(|report| report.as_ref().is_some_and(|r| r.id == id))
            .await
            .ok()?;
        report.clone()
    }

    /// Run the request guard against the current state
    pub async fn check_invariants(&self) -> Result<()> {
        let st = self.state.lock().await;
        guard::check(&st)
    }

    pub async fn status(&self) -> Result<StatusSnapshot> {
        let st = self.state.lock().await;
        guard::check(&st)?;
        Ok(StatusSnapshot {
            state: st.state().clone(),
            job: st.active_job().map(|job| JobInfo {
                id: job.id,
                input_path: job.input_path.clone(),
                started_at: job.started_at,
            }),
        })
    }

    /// Id of the loaded engine, if any
    pub async fn engine_id(&self) -> Option<Uuid> {
        self.state.lock().await.engine().map(|engine| engine.id())
    }

    /// Load the engine; a no-op if it is already loaded
    pub async fn load(&self) -> Result<LoadOutcome> {
        let mut st = self.state.lock().await;
        guard::check(&st)?;

        let outcome = st.load(self.backend.as_ref(), &self.config)?;
        match outcome {
            LoadOutcome::Loaded => tracing::info!(
                "Model loaded: {} on {}",
                self.config.model_name(),
                self.config.device.device_type()
            ),
            LoadOutcome::AlreadyLoaded => tracing::info!("Model already loaded"),
        }
        self.publish(&st);
        Ok(outcome)
    }

    /// Release the engine; a no-op if nothing is loaded
    pub async fn unload(&self) -> Result<UnloadOutcome> {
        let mut st = self.state.lock().await;
        guard::check(&st)?;

        let model = st.engine().map(|engine| engine.model_name().to_string());
        let outcome = st.unload()?;
        match outcome {
            UnloadOutcome::Unloaded => {
                tracing::info!("Model unloaded: {}", model.unwrap_or_default())
            }
            UnloadOutcome::AlreadyUnloaded => tracing::info!("Model already unloaded"),
        }
        self.publish(&st);
        Ok(outcome)
    }

    /// Start transcribing `input` in the background
    ///
    /// Returns as soon as the job is recorded. Either way the service returns
    /// to `Loaded`; the outcome is logged and published for
    /// [`Controller::job_report`].
    pub async fn start_job(self: &Arc<Self>, input: impl Into<PathBuf>) -> Result<Uuid> {
        let input = input.into();
        let mut st = self.state.lock().await;
        guard::check(&st)?;

        let engine = st.prepare_start(&input)?;
        let id = Uuid::new_v4();

        let worker_input = input.clone();
        let worker = tokio::spawn(async move { engine.transcribe(&worker_input).await });

        let controller = Arc::clone(self);
        let job_input = input.clone();
        let task = tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match worker.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => Err(anyhow!("transcription worker panicked")),
                Err(e) => Err(anyhow!("transcription worker stopped: {}", e)),
            };
            controller.finish_job(id, job_input, started, outcome).await;
        });

        st.start(ActiveJob {
            id,
            input_path: input.clone(),
            started_at: Utc::now(),
            task,
        });
        tracing::info!(job_id = %id, "Transcription started for path: {}", input.display());
        self.publish(&st);
        Ok(id)
    }

    /// Completion transition, run by the job's supervisor
    async fn finish_job(
        &self,
        id: Uuid,
        input: PathBuf,
        started: Instant,
        outcome: anyhow::Result<()>,
    ) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(()) => tracing::info!(
                job_id = %id,
                elapsed_ms,
                "Transcription completed for path: {}",
                input.display()
            ),
            Err(e) => tracing::error!(
                job_id = %id,
                elapsed_ms,
                "Transcription failed for path {}: {:#}",
                input.display(),
                e
            ),
        }

        let mut st = self.state.lock().await;
        if st.complete(id).is_none() {
            tracing::warn!(job_id = %id, "Completion for a job that is no longer active");
            return;
        }
        self.report_tx.send_replace(Some(JobReport {
            id,
            input_path: input,
            elapsed_ms,
            error: outcome.err().map(|e| format!("{:#}", e)),
        }));
        self.publish(&st);
    }

    /// Log the job left behind when the service stops
    ///
    /// The job is not cancelled; it dies with the process.
    pub async fn report_abandoned(&self) -> Option<PathBuf> {
        let st = self.state.lock().await;
        let job = st.active_job()?;
        if job.task.is_finished() {
            return None;
        }
        tracing::warn!(
            job_id = %job.id,
            "Shutting down while transcribing {}; job abandoned",
            job.input_path.display()
        );
        Some(job.input_path.clone())
    }

    /// Overwrite the declared state without touching engine or job
    #[cfg(test)]
    pub(crate) async fn force_state(&self, state: ModelState) {
        self.state.lock().await.state = state;
    }

    fn publish(&self, st: &ServiceState) {
        self.state_tx.send_if_modified(|current| {
            if current == st.state() {
                return false;
            }
            *current = st.state().clone();
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::engine::error::ControlError;
    use crate::engine::testing::{GatedBackend, JobBehavior};

    async fn wait_until_loaded(controller: &Controller) {
        let mut rx = controller.subscribe();
        tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|state| *state == ModelState::Loaded),
        )
        .await
        .expect("job did not complete")
        .unwrap();
    }

    fn controller(behavior: JobBehavior) -> (Arc<Controller>, GatedBackend) {
        let backend = GatedBackend::new(behavior);
        let handle = backend.clone();
        (Arc::new(Controller::new(EngineConfig::default(), backend)), handle)
    }

    #[tokio::test]
    async fn test_repeated_load_unload_keeps_engine_and_state_aligned() {
        let (c, _) = controller(JobBehavior::Succeed);
        let ops = [true, true, false, false, true, false, true, true];
        for load in ops {
            if load {
                c.load().await.unwrap();
            } else {
                c.unload().await.unwrap();
            }
            let status = c.status().await.unwrap();
            assert_eq!(c.engine_id().await.is_some(), status.state == ModelState::Loaded);
        }
    }

    #[tokio::test]
    async fn test_second_load_keeps_same_engine() {
        let (c, backend) = controller(JobBehavior::Succeed);
        assert_eq!(c.load().await.unwrap(), LoadOutcome::Loaded);
        let first = c.engine_id().await;
        assert_eq!(c.load().await.unwrap(), LoadOutcome::AlreadyLoaded);
        assert_eq!(c.engine_id().await, first);
        assert_eq!(backend.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_without_engine_is_rejected() {
        let (c, _) = controller(JobBehavior::Succeed);
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = c.start_job(file.path()).await.unwrap_err();
        assert!(matches!(err, ControlError::NotLoaded));
        let status = c.status().await.unwrap();
        assert_eq!(status.state, ModelState::Unloaded);
        assert!(status.job.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_create_one_job() {
        let (c, backend) = controller(JobBehavior::Succeed);
        let file = tempfile::NamedTempFile::new().unwrap();
        c.load().await.unwrap();

        let (a, b) = tokio::join!(c.start_job(file.path()), c.start_job(file.path()));
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ControlError::Busy(_)))));

        let status = c.status().await.unwrap();
        let started = results.iter().find_map(|r| r.as_ref().ok()).copied();
        assert_eq!(status.job.map(|job| job.id), started);

        backend.gate.add_permits(1);
        wait_until_loaded(&c).await;
    }

    #[tokio::test]
    async fn test_job_outcomes_return_to_loaded() {
        for behavior in [JobBehavior::Succeed, JobBehavior::Fail, JobBehavior::Panic] {
            let (c, backend) = controller(behavior);
            let file = tempfile::NamedTempFile::new().unwrap();
            c.load().await.unwrap();
            let engine = c.engine_id().await;

            c.start_job(file.path()).await.unwrap();
            assert_eq!(
                c.status().await.unwrap().state,
                ModelState::Running(file.path().to_path_buf())
            );

            backend.gate.add_permits(1);
            wait_until_loaded(&c).await;

            let status = c.status().await.unwrap();
            assert_eq!(status.state, ModelState::Loaded, "{:?}", behavior);
            assert!(status.job.is_none());
            assert_eq!(c.engine_id().await, engine);
        }
    }

    #[tokio::test]
    async fn test_job_report_carries_outcome() {
        for (behavior, success) in [
            (JobBehavior::Succeed, true),
            (JobBehavior::Fail, false),
            (JobBehavior::Panic, false),
        ] {
            let (c, backend) = controller(behavior);
            let file = tempfile::NamedTempFile::new().unwrap();
            c.load().await.unwrap();
            let id = c.start_job(file.path()).await.unwrap();

            backend.gate.add_permits(1);
            let report = tokio::time::timeout(Duration::from_secs(5), c.job_report(id))
                .await
                .expect("job did not complete")
                .unwrap();
            assert_eq!(report.id, id);
            assert_eq!(report.input_path, file.path());
            assert_eq!(report.is_success(), success, "{:?}", behavior);

            // A finished job's report is still available afterwards
            assert_eq!(c.job_report(id).await, Some(report));
        }
    }

    #[tokio::test]
    async fn test_load_and_unload_rejected_while_running() {
        let (c, backend) = controller(JobBehavior::Succeed);
        let file = tempfile::NamedTempFile::new().unwrap();
        c.load().await.unwrap();
        c.start_job(file.path()).await.unwrap();

        assert!(matches!(c.unload().await, Err(ControlError::Busy(_))));
        assert!(matches!(c.load().await, Err(ControlError::Busy(_))));
        assert!(c.status().await.unwrap().job.is_some());
        assert!(c.check_invariants().await.is_ok());
        assert_eq!(c.report_abandoned().await, Some(file.path().to_path_buf()));

        backend.gate.add_permits(1);
        wait_until_loaded(&c).await;
    }

    #[tokio::test]
    async fn test_invalid_path_leaves_state_loaded() {
        let (c, _) = controller(JobBehavior::Succeed);
        c.load().await.unwrap();
        let err = c.start_job("/no/such/input.wav").await.unwrap_err();
        assert!(matches!(err, ControlError::InvalidPath(_)));
        let status = c.status().await.unwrap();
        assert_eq!(status.state, ModelState::Loaded);
        assert!(status.job.is_none());
    }
}
