//! Template source watcher for live re-rendering.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::schema::WatchConfig;

/// Watches one file and reports changes to it.
pub struct SourceWatcher {
    path: PathBuf,
    poll_interval: Duration,
    debounce: Duration,
    change_tx: mpsc::UnboundedSender<PathBuf>,
}

impl SourceWatcher {
    /// Create a new SourceWatcher.
    ///
    /// Returns the watcher and a receiver of change notifications.
    pub fn new(path: &Path, config: &WatchConfig) -> (Self, mpsc::UnboundedReceiver<PathBuf>) {
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                poll_interval: Duration::from_millis(config.poll_interval_ms),
                debounce: Duration::from_millis(config.debounce_ms),
                change_tx,
            },
            change_rx,
        )
    }

    /// Start watching. Dropping the returned watcher stops notifications.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx;
        let path = self.path.clone();
        let debounce = Debouncer::new(self.debounce);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if (event.kind.is_modify() || event.kind.is_create()) && debounce.ready() {
                        tracing::info!(path = %path.display(), "Template source changed");
                        let _ = tx.send(path.clone());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?self.path, "Source watcher started");
        Ok(watcher)
    }
}

/// Lets one event through per `window`.
struct Debouncer {
    window: Duration,
    last: Mutex<Option<Instant>>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    fn ready(&self) -> bool {
        let now = Instant::now();
        let Ok(mut last) = self.last.lock() else {
            return true;
        };
        match *last {
            Some(previous) if now.duration_since(previous) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}
