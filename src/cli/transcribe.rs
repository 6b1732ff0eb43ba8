//! One-shot transcription command

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Result};

use super::EngineArgs;
use crate::engine::{CommandBackend, Controller};

/// Load the engine, run one job through the controller and wait for it
///
/// Fails when the job fails, after the engine has been released.
pub async fn transcribe(path: PathBuf, engine: EngineArgs) -> Result<()> {
    let config = engine.load_config()?;
    let controller = Arc::new(Controller::new(config.engine, CommandBackend));

    let start = Instant::now();
    controller.load().await?;
    println!("Loaded {}", controller.config().model_name());

    let job_id = controller.start_job(&path).await?;
    println!("Transcribing {} (job {})", path.display(), job_id);

    let report = controller
        .job_report(job_id)
        .await
        .ok_or_else(|| anyhow!("job {} finished without a report", job_id))?;

    controller.unload().await?;
    if let Some(error) = report.error {
        bail!("transcription of {} failed: {}", path.display(), error);
    }
    println!("Finished in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
