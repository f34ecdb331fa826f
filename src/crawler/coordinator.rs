//! Crawl orchestration
//!
//! This module contains the crawl loop that drives the frontier:
//! - Clearing (or keeping) the provider's frontier and seeding entry URLs
//! - Pulling batches of unprocessed links
//! - Fetching each batch through the fetch client
//! - Discovering new links, extracting records and marking link status
//! - Shutting the fetch client down and flushing output

use crate::config::CrawlMode;
use crate::crawler::discovery::LinkDiscovery;
use crate::crawler::progress::ProgressLogger;
use crate::crawler::{CrawlerBuilder, ItemHook, SharedLinkStore};
use crate::fetch::{FetchClient, FetchResult};
use crate::output::{DataEntry, DataStore};
use crate::state::{CrawlPhase, LinkStatus};
use crate::storage::{Link, LinkStore, NewLink, StorageError, StorageResult};
use crate::{Config, HarvestError};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lower bound on how many links are pulled per batch
///
/// Batches are `max(concurrency, BATCH_FLOOR)` links. The value 10 has no
/// known derivation and may be arbitrary.
pub const BATCH_FLOOR: usize = 10;

/// Default period of the progress log line
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

/// Counters for one crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Links handed to the fetch client
    pub pages_fetched: u64,
    /// Links marked PROCESSED
    pub pages_processed: u64,
    /// Links marked FAILED
    pub pages_failed: u64,
    /// Discovered links that were new to the frontier
    pub links_discovered: u64,
    /// Records forwarded to the data store
    pub records_emitted: u64,
}

/// A configured crawl over one provider's frontier
pub struct Crawler {
    pub(crate) provider: String,
    pub(crate) mode: CrawlMode,
    pub(crate) entry_urls: Vec<String>,
    pub(crate) concurrency: usize,
    pub(crate) discovery: LinkDiscovery,
    pub(crate) on_item_crawled: ItemHook,
    pub(crate) store: SharedLinkStore,
    pub(crate) data_store: Box<dyn DataStore>,
    pub(crate) client: Box<dyn FetchClient>,
    pub(crate) progress_interval: Duration,
    pub(crate) phase: CrawlPhase,
}

impl Crawler {
    /// Starts building a crawler from a configuration
    pub fn builder(config: Config) -> CrawlerBuilder {
        CrawlerBuilder::new(config)
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// The phase the crawler is in (Done after a finished crawl)
    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Shared handle on the link store, for inspection after a crawl
    pub fn link_store(&self) -> SharedLinkStore {
        SharedLinkStore::clone(&self.store)
    }

    /// Runs the crawl until no unprocessed links remain
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The frontier was exhausted
    /// * `Err(HarvestError)` - Storage, output or client start-up failed;
    ///   the fetch client is shut down and buffered records are flushed
    ///   before returning
    pub async fn crawl(&mut self) -> Result<CrawlReport, HarvestError> {
        let started = Instant::now();
        self.phase = CrawlPhase::Init;
        tracing::info!("Crawl started for provider '{}'", self.provider);

        self.enter(CrawlPhase::Seeding);
        self.seed()?;
        self.data_store.before_crawl()?;

        if let Err(e) = self.client.initialize().await {
            if let Err(shutdown) = self.client.shutdown().await {
                tracing::warn!("Fetch client shutdown after failed start: {}", shutdown);
            }
            return Err(e.into());
        }

        let progress = ProgressLogger::start(
            self.link_store(),
            self.provider.clone(),
            self.progress_interval,
        );

        self.enter(CrawlPhase::Looping);
        let mut report = CrawlReport::default();
        let looped = self.run_loop(&mut report).await;
        drop(progress);

        self.enter(CrawlPhase::Draining);
        let shutdown = self.client.shutdown().await;
        let flushed = self.data_store.after_crawl();

        if let Err(e) = looped {
            if let Err(shutdown) = shutdown {
                tracing::warn!("Fetch client shutdown after failed crawl: {}", shutdown);
            }
            if let Err(flush) = flushed {
                tracing::warn!("Output flush after failed crawl: {}", flush);
            }
            return Err(e);
        }
        shutdown?;
        flushed?;

        self.enter(CrawlPhase::Done);
        tracing::info!(
            "Crawl finished in {:.1}s: {} processed, {} failed, {} new links, {} records",
            started.elapsed().as_secs_f64(),
            report.pages_processed,
            report.pages_failed,
            report.links_discovered,
            report.records_emitted
        );
        Ok(report)
    }

    fn enter(&mut self, next: CrawlPhase) {
        tracing::info!("Crawl phase: {} -> {}", self.phase, next);
        self.phase = next;
    }

    fn with_store<T>(
        &self,
        f: impl FnOnce(&mut dyn LinkStore) -> StorageResult<T>,
    ) -> Result<T, StorageError> {
        let mut store = self.store.lock().map_err(|_| StorageError::LockPoisoned)?;
        f(&mut **store)
    }

    /// Clears the frontier when starting from scratch, then adds entry URLs
    fn seed(&self) -> Result<(), StorageError> {
        self.with_store(|store| {
            if self.mode == CrawlMode::StartFromScratch {
                let removed = store.delete_all(&self.provider)?;
                tracing::info!("Cleared {} links of provider '{}'", removed, self.provider);
            }

            for url in &self.entry_urls {
                if store
                    .add_if_new(NewLink::unprocessed(self.provider.as_str(), url.as_str()))?
                    .is_some()
                {
                    tracing::debug!("Seeded {}", url);
                }
            }
            Ok(())
        })
    }

    async fn run_loop(&mut self, report: &mut CrawlReport) -> Result<(), HarvestError> {
        let batch_size = self.concurrency.max(BATCH_FLOOR);

        loop {
            let batch = self.with_store(|store| {
                store.find_by_provider_and_status(
                    &self.provider,
                    LinkStatus::Unprocessed,
                    batch_size,
                )
            })?;

            if batch.is_empty() {
                tracing::info!("No unprocessed links left");
                return Ok(());
            }

            let urls: Vec<String> = batch.iter().map(|link| link.url.clone()).collect();
            tracing::debug!("Fetching batch of {} links", urls.len());
            let mut results = results_by_url(self.client.get(&urls).await);

            for link in &batch {
                let result = results.remove(link.url.as_str()).unwrap_or_else(|| {
                    tracing::error!("Fetch client returned no result for {}", link.url);
                    FetchResult::failed(link.url.as_str())
                });

                report.pages_fetched += 1;
                self.handle_result(link, result, report)?;
            }

            for url in results.keys() {
                tracing::warn!("Ignoring fetch result for unrequested URL {}", url);
            }
        }
    }

    fn handle_result(
        &mut self,
        link: &Link,
        result: FetchResult,
        report: &mut CrawlReport,
    ) -> Result<(), HarvestError> {
        let page = match result.page {
            Some(page) if result.success => page,
            _ => {
                self.with_store(|store| store.change_status(link.id, LinkStatus::Failed))?;
                report.pages_failed += 1;
                return Ok(());
            }
        };

        let discovered = self.discovery.extract_links(&page);
        let added = self.with_store(|store| {
            let mut added = 0;
            for url in discovered {
                if store
                    .add_if_new(NewLink::unprocessed(self.provider.as_str(), url))?
                    .is_some()
                {
                    added += 1;
                }
            }
            Ok(added)
        })?;
        report.links_discovered += added;

        if let Some(data) = (self.on_item_crawled)(&page) {
            self.data_store
                .add_data(DataEntry::new(self.provider.as_str(), link.url.as_str(), data))?;
            report.records_emitted += 1;
        }

        self.with_store(|store| store.change_status(link.id, LinkStatus::Processed))?;
        report.pages_processed += 1;
        Ok(())
    }
}

/// Keys a batch's results by requested URL; the first result for a URL wins
fn results_by_url(results: Vec<FetchResult>) -> HashMap<String, FetchResult> {
    let mut by_url = HashMap::with_capacity(results.len());
    for result in results {
        by_url.entry(result.url.clone()).or_insert(result);
    }
    by_url
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("provider", &self.provider)
            .field("mode", &self.mode)
            .field("entry_urls", &self.entry_urls)
            .field("concurrency", &self.concurrency)
            .field("discovery", &self.discovery)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
