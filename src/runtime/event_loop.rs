//! Event processing.
//!
//! # Data Flow
//! ```text
//! Location change ──► NavigationEvent ──┐
//!                                       ├──► App::run ──► update_all / dispatch
//! User interaction ──► Interaction ─────┘         ▲
//!                                                 │
//! Shutdown broadcast ─────────────────────────────┘ (exit)
//! ```
//!
//! # Design Decisions
//! - Every event runs to completion before the next one is taken
//! - Each navigation notification causes exactly one broadcast
//! - Dispatch failures are logged, never surfaced to the UI

use tokio::sync::{broadcast, mpsc};

use crate::observability::metrics;
use crate::reactive::InstanceId;
use crate::routing::NavigationEvent;
use crate::runtime::app::App;

/// A user interaction with a rendered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub instance: InstanceId,
    /// Index into the instance's handler table.
    pub handler: usize,
}

impl App {
    /// Handle queued navigation notifications; returns how many were handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let event = match self.navigation.as_mut().map(|rx| rx.try_recv()) {
                Some(Ok(event)) => event,
                _ => break,
            };
            self.on_navigation(event);
            handled += 1;
        }
        handled
    }

    /// Run until `shutdown` fires or the interaction channel closes.
    pub async fn run(
        &mut self,
        mut interactions: mpsc::UnboundedReceiver<Interaction>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        if self.navigation.is_none() {
            self.init();
        }
        self.process_pending();

        let mut navigation = self.navigation.take();
        tracing::info!("Event loop started");
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested; leaving event loop");
                    break;
                }
                Some(event) = next_navigation(&mut navigation) => {
                    self.on_navigation(event);
                }
                interaction = interactions.recv() => match interaction {
                    Some(interaction) => self.on_interaction(interaction),
                    None => {
                        tracing::info!("Interaction source closed; leaving event loop");
                        break;
                    }
                },
            }
        }
        self.navigation = navigation;
    }

    fn on_navigation(&mut self, event: NavigationEvent) {
        tracing::debug!(old = %event.old, new = %event.new, "Navigation notification");
        metrics::record_route_change();
        self.update_all();
    }

    fn on_interaction(&mut self, interaction: Interaction) {
        if let Err(e) = self.dispatch(interaction.instance, interaction.handler) {
            tracing::warn!(
                instance = %interaction.instance,
                handler = interaction.handler,
                error = %e,
                "Handler dispatch failed"
            );
        }
    }
}

async fn next_navigation(
    navigation: &mut Option<mpsc::UnboundedReceiver<NavigationEvent>>,
) -> Option<NavigationEvent> {
    match navigation {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
