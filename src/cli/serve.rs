//! HTTP server command

use std::sync::Arc;

use anyhow::Result;

use super::EngineArgs;
use crate::engine::{CommandBackend, Controller};
use crate::server;

/// Start the control server
pub async fn serve(
    port: u16,
    api_key: String,
    host: Option<String>,
    engine: EngineArgs,
) -> Result<()> {
    let mut config = engine.load_config()?;
    config.server.port = port;
    config.server.api_key = api_key;
    if let Some(host) = host {
        config.server.host = host;
    }
    config.server.validate()?;

    tracing::info!(
        "Engine: {} on {} ({})",
        config.engine.model_name(),
        config.engine.device.device_type(),
        config.engine.language
    );

    let controller = Arc::new(Controller::new(config.engine, CommandBackend));

    tracing::info!("Starting server at http://{}", config.server.addr());
    server::start(controller, config.server).await?;

    Ok(())
}
