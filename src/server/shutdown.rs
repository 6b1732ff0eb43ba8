//! Shutdown signalling for the HTTP server

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;

/// Trigger shared by the `/stop` handler and the server loop
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    grace: Duration,
}

impl Shutdown {
    pub fn new(grace: Duration) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            grace,
        }
    }

    /// Ask the server to stop once the grace period has passed
    ///
    /// Returns immediately so the caller can still answer its request.
    pub fn request(&self) {
        let tx = Arc::clone(&self.tx);
        let grace = self.grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            tx.send_replace(true);
        });
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once a stop has been triggered
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

/// Wait for `/stop`, Ctrl+C or SIGTERM
pub async fn shutdown_signal(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
        _ = shutdown.triggered() => tracing::info!("Stop requested, shutting down..."),
    }
}
