//! Engine backed by an external transcription command
//!
//! Each job runs `<command> <input> --model M --device D --language L`
//! (plus `--device_index`, `--output_dir` and any extra arguments) and
//! succeeds when the command exits cleanly.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use tokio::process::Command;

use super::backend::{EngineBackend, Transcriber};
use crate::config::EngineConfig;

/// Backend that shells out to a whisper-style CLI
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandBackend;

impl EngineBackend for CommandBackend {
    fn load(&self, config: &EngineConfig) -> Result<Arc<dyn Transcriber>> {
        let program = PathBuf::from(&config.command);
        if program.components().count() > 1 && !program.exists() {
            bail!("engine command not found: {}", program.display());
        }

        let config = config.clone().resolved();
        let mut args = vec![
            "--model".to_string(),
            config.model_name().to_string(),
            "--device".to_string(),
            config.device.device_type().to_string(),
        ];
        if config.device.is_cuda() && config.device.device_id() != 0 {
            args.push("--device_index".to_string());
            args.push(config.device.device_id().to_string());
        }
        args.push("--language".to_string());
        args.push(config.language.clone());
        if let Some(dir) = &config.output_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create output dir {}", dir.display()))?;
            args.push("--output_dir".to_string());
            args.push(dir.display().to_string());
        }
        args.extend(config.extra_args.iter().cloned());

        tracing::debug!("Engine command: {} {:?}", program.display(), args);
        Ok(Arc::new(CommandTranscriber { program, args }))
    }
}

/// Loaded form of [`CommandBackend`]
struct CommandTranscriber {
    program: PathBuf,
    args: Vec<String>,
}

impl Transcriber for CommandTranscriber {
    fn transcribe<'a>(&'a self, input: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let output = Command::new(&self.program)
                .arg(input)
                .args(&self.args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .with_context(|| format!("failed to spawn {}", self.program.display()))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    stderr.trim()
                );
            }
            Ok(())
        })
    }
}
