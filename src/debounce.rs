use std::time::Duration;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::sleep,
};
use tracing::debug;

use crate::editor::ContentAnalysis;

pub const DEFAULT_ANALYSIS_WINDOW: Duration = Duration::from_millis(300);

const CHANGE_BUFFER: usize = 64;

/// Runs `compute` once per pause in input. Every change restarts the quiet
/// window; when the window elapses the latest content is computed and
/// published. Exits when the change channel closes or nobody is listening.
pub async fn run_debounced<T, F>(
    mut changes: mpsc::Receiver<String>,
    results: watch::Sender<Option<T>>,
    window: Duration,
    mut compute: F,
) where
    F: FnMut(&str) -> T,
{
    while let Some(mut latest) = changes.recv().await {
        let mut coalesced = 0usize;

        loop {
            tokio::select! {
                next = changes.recv() => match next {
                    Some(content) => {
                        latest = content;
                        coalesced += 1;
                    }
                    None => break,
                },
                _ = sleep(window) => break,
            }
        }

        debug!(coalesced, content_len = latest.len(), "Running debounced computation");

        if results.send(Some(compute(&latest))).is_err() {
            break;
        }
    }
}

/// Background task analyzing editor content after each pause in typing.
pub struct ContentAnalyzer {
    changes: mpsc::Sender<String>,
    results: watch::Receiver<Option<ContentAnalysis>>,
    handle: JoinHandle<()>,
}

impl ContentAnalyzer {
    pub fn spawn(window: Duration) -> Self {
        let (changes, change_rx) = mpsc::channel(CHANGE_BUFFER);
        let (result_tx, results) = watch::channel(None);

        let handle = tokio::spawn(run_debounced(change_rx, result_tx, window, ContentAnalysis::of));

        Self {
            changes,
            results,
            handle,
        }
    }

    /// False once the analyzer has stopped.
    pub async fn content_changed(&self, content: impl Into<String>) -> bool {
        self.changes.send(content.into()).await.is_ok()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ContentAnalysis>> {
        self.results.clone()
    }

    pub fn latest(&self) -> Option<ContentAnalysis> {
        self.results.borrow().clone()
    }

    pub async fn shutdown(self) {
        drop(self.changes);
        let _ = self.handle.await;
    }
}
