//! Shutdown fan-out for the monitor's tasks.

use tokio::sync::broadcast;
use tracing::{info, warn};

/// Cloneable shutdown trigger. Each task holds its own receiver from
/// [`subscribe`](Self::subscribe) and selects on it.
#[derive(Clone)]
pub struct ShutdownController(broadcast::Sender<()>);

impl ShutdownController {
    pub fn new() -> Self {
        Self(broadcast::channel(1).0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.0.subscribe()
    }

    pub fn shutdown(&self) {
        let _ = self.0.send(());
    }

    /// Trigger shutdown once SIGINT or SIGTERM arrives.
    pub async fn wait_for_signal(&self) {
        let signal = termination_signal().await;
        info!(signal, "shutting down");
        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn termination_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        },
        Err(e) => {
            warn!("SIGTERM handler unavailable, waiting for SIGINT only: {e}");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn termination_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
