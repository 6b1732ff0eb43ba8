//! HTTP control surface
//!
//! Exposes the engine lifecycle as a small JSON API.

mod error;
mod handlers;
mod interceptors;
mod routes;
mod shutdown;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::engine::Controller;

pub use error::ApiError;
pub use handlers::{AppState, StatusMessage, StatusResponse, TranscribeResponse, VersionResponse};
pub use routes::api_routes;
pub use shutdown::{shutdown_signal, Shutdown};

/// Build the application router around `state`
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP control server and run until shutdown
pub async fn start(controller: Arc<Controller>, config: ServerConfig) -> Result<()> {
    config.validate()?;

    let shutdown = Shutdown::new(config.shutdown_grace());
    let state = Arc::new(AppState::new(
        Arc::clone(&controller),
        config.api_key.clone(),
        shutdown.clone(),
    ));
    let app = router(state);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /version - Service version");
    tracing::info!("  GET  /status - Lifecycle state");
    tracing::info!("  POST /load_model - Load the engine");
    tracing::info!("  POST /unload_model - Release the engine");
    tracing::info!("  POST /start_transcribe - Start a transcription job");
    tracing::info!("  POST /stop - Shut the service down");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    controller.report_abandoned().await;
    tracing::info!("Server stopped");
    Ok(())
}
