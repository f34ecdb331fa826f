//! Periodic crawl progress logging

use crate::crawler::SharedLinkStore;
use crate::state::LinkStatus;
use crate::storage::{LinkStore, StorageError, StorageResult};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// Logs frontier counts on a fixed interval until dropped
///
/// The first line is logged one interval after start. Dropping the logger
/// aborts the background task, so every exit path of the crawl loop stops it.
pub(crate) struct ProgressLogger {
    handle: JoinHandle<()>,
}

impl ProgressLogger {
    pub(crate) fn start(store: SharedLinkStore, provider: String, every: Duration) -> Self {
        let every = every.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            loop {
                ticker.tick().await;
                match progress_counts(&store, &provider) {
                    Ok((processed, remaining)) => {
                        tracing::info!("Crawled {} urls. Remaining: {}", processed, remaining)
                    }
                    Err(e) => tracing::warn!("Could not read crawl progress: {}", e),
                }
            }
        });

        Self { handle }
    }
}

impl Drop for ProgressLogger {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Returns `(processed, unprocessed)` for a provider
fn progress_counts(store: &SharedLinkStore, provider: &str) -> StorageResult<(u64, u64)> {
    let store = store
        .lock()
        .map_err(|_| StorageError::LockPoisoned)?;
    let processed = store.count_by_provider_and_status(provider, LinkStatus::Processed)?;
    let remaining = store.count_by_provider_and_status(provider, LinkStatus::Unprocessed)?;
    Ok((processed, remaining))
}
