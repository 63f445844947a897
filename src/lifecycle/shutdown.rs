//! Shutdown coordination for the event loop.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Cloning yields another trigger for the same broadcast, so a signal task
/// can own one handle while the caller keeps another.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe before triggering; a late subscriber misses the signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Trigger once Ctrl-C is received.
    pub fn trigger_on_ctrl_c(&self) -> tokio::task::JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Ctrl-C received"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
            }
            shutdown.trigger();
        })
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
