use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scribe::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribe=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            api_key,
            host,
            engine,
        } => {
            tracing::info!("Starting app");
            scribe::cli::serve(port, api_key, host, engine).await?;
            tracing::info!("App stopped");
        }
        Commands::Transcribe { path, engine } => {
            scribe::cli::transcribe(path, engine).await?;
        }
        Commands::Info { engine } => {
            scribe::cli::info(engine).await?;
        }
    }

    Ok(())
}
