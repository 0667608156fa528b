//! API document watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::descriptor::{ApiDocument, DocumentSource};

/// Monitors an API document and emits each successfully parsed revision.
pub struct DocumentWatcher {
    source: DocumentSource,
    update_tx: mpsc::UnboundedSender<ApiDocument>,
}

impl DocumentWatcher {
    /// Create a new DocumentWatcher.
    ///
    /// Returns the watcher and a receiver for document updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ApiDocument>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                source: DocumentSource::new(path),
                update_tx,
            },
            update_rx,
        )
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    /// Start watching the file. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let source = self.source.clone();
        let path: PathBuf = self.source.path().to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?source.path(), "API document change detected, reloading");
                        match source.load() {
                            Ok(document) => {
                                let _ = tx.send(document);
                            }
                            Err(e) => {
                                tracing::error!(
                                    error = %e,
                                    "Failed to reload API document, keeping current routes"
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "API document watcher started");
        Ok(watcher)
    }
}
