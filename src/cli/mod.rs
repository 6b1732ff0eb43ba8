//! CLI commands

mod info;
mod serve;
mod transcribe;

pub use info::info;
pub use serve::serve;
pub use transcribe::transcribe;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::ScribeConfig;

/// Scribe - control service for a single transcription engine
#[derive(Parser)]
#[command(name = "scribe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP control server
    Serve {
        /// Port to listen on
        port: u16,

        /// Shared secret clients send in the Authorization header
        #[arg(env = "SCRIBE_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Load the engine and transcribe one input in the foreground
    Transcribe {
        /// Input to transcribe
        path: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Print the resolved configuration
    Info {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Engine settings shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// YAML or JSON configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Model name (default: large-v2 on CUDA, small.en on CPU)
    #[arg(long, short)]
    pub model: Option<String>,

    /// Device: auto, cpu, cuda or cuda:N
    #[arg(long)]
    pub device: Option<String>,

    /// Language of the input audio
    #[arg(long)]
    pub language: Option<String>,
}

impl EngineArgs {
    /// Read the config file and apply the command-line overrides
    pub fn load_config(self) -> Result<ScribeConfig> {
        let mut config = ScribeConfig::load(self.config.as_deref())?;
        config.override_engine(self.model, self.device, self.language);
        config.engine = config.engine.resolved();
        Ok(config)
    }
}
