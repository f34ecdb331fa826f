//! Crawler assembly
//!
//! Turns a validated configuration plus caller hooks into a [`Crawler`],
//! filling in the default link store, data store and fetch client for
//! anything the caller did not inject.

use crate::config::{validate, Backend, Config};
use crate::crawler::coordinator::{Crawler, DEFAULT_PROGRESS_INTERVAL};
use crate::crawler::discovery::{LinkDiscovery, LinksHook};
use crate::crawler::{ItemHook, SharedLinkStore};
use crate::fetch::{
    ChromiumRenderer, ClientSettings, DirectClient, FetchClient, FetchRequest, Page,
    RenderedClient, Renderer, RequestHook,
};
use crate::output::{DataStore, FileDataStore, Record};
use crate::state::CrawlPhase;
use crate::storage::{LinkStore, SqliteLinkStore};
use crate::{ConfigError, HarvestError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Caller-supplied crawl hooks
///
/// Only `on_item_crawled` is required.
#[derive(Clone, Default)]
pub struct Hooks {
    /// Turns a fetched page into a record; `None` emits nothing
    pub on_item_crawled: Option<ItemHook>,
    /// Final filter over the links discovered on a page
    pub on_links_discovered: Option<LinksHook>,
    /// Rewrites each outgoing request before it is sent
    pub before_request: Option<RequestHook>,
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_item_crawled", &self.on_item_crawled.is_some())
            .field("on_links_discovered", &self.on_links_discovered.is_some())
            .field("before_request", &self.before_request.is_some())
            .finish()
    }
}

/// Builder for [`Crawler`]
pub struct CrawlerBuilder {
    config: Config,
    hooks: Hooks,
    link_store: Option<Box<dyn LinkStore>>,
    data_store: Option<Box<dyn DataStore>>,
    fetch_client: Option<Box<dyn FetchClient>>,
    renderer: Option<Arc<dyn Renderer>>,
    progress_interval: Duration,
}

impl CrawlerBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            hooks: Hooks::default(),
            link_store: None,
            data_store: None,
            fetch_client: None,
            renderer: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn on_item_crawled<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Page) -> Option<Record> + Send + Sync + 'static,
    {
        self.hooks.on_item_crawled = Some(Arc::new(hook));
        self
    }

    pub fn on_links_discovered<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Page, Vec<String>) -> Vec<String> + Send + Sync + 'static,
    {
        self.hooks.on_links_discovered = Some(Arc::new(hook));
        self
    }

    pub fn before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(FetchRequest) -> FetchRequest + Send + Sync + 'static,
    {
        self.hooks.before_request = Some(Arc::new(hook));
        self
    }

    /// Replaces all hooks at once
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Uses the given frontier instead of the SQLite file from the config
    pub fn link_store(mut self, store: impl LinkStore + 'static) -> Self {
        self.link_store = Some(Box::new(store));
        self
    }

    /// Uses the given data store instead of JSON files under `data-path`
    pub fn data_store(mut self, store: impl DataStore + 'static) -> Self {
        self.data_store = Some(Box::new(store));
        self
    }

    /// Uses the given fetch client, ignoring the configured backend
    pub fn fetch_client(mut self, client: impl FetchClient + 'static) -> Self {
        self.fetch_client = Some(Box::new(client));
        self
    }

    /// Renderer for the rendered backend; defaults to headless Chromium
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// How often crawl progress is logged
    pub fn progress_interval(mut self, every: Duration) -> Self {
        self.progress_interval = every;
        self
    }

    /// Validates the configuration and assembles the crawler
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(HarvestError::Config)` - Invalid configuration, a bad path
    ///   pattern or a missing `on_item_crawled` hook
    /// * `Err(HarvestError)` - The default link store or fetch client could
    ///   not be created
    pub fn build(self) -> Result<Crawler, HarvestError> {
        let config = self.config;
        validate(&config)?;

        let on_item_crawled = self
            .hooks
            .on_item_crawled
            .ok_or(ConfigError::MissingHook("on_item_crawled"))?;

        let discovery =
            LinkDiscovery::from_config(&config)?.with_links_hook(self.hooks.on_links_discovered);

        let data_store: Box<dyn DataStore> = match self.data_store {
            Some(store) => store,
            None => {
                let data_path = config.output.data_path.clone().ok_or_else(|| {
                    ConfigError::Validation(
                        "data-path is required unless a data store is supplied".to_string(),
                    )
                })?;
                Box::new(FileDataStore::new(data_path, config.output.data_batch_size))
            }
        };

        let client: Box<dyn FetchClient> = match self.fetch_client {
            Some(client) => client,
            None => {
                let settings =
                    ClientSettings::from_config(&config.client, self.hooks.before_request);
                match config.client.backend {
                    Backend::Direct => Box::new(DirectClient::new(settings)?),
                    Backend::Rendered => {
                        let renderer: Arc<dyn Renderer> = match self.renderer {
                            Some(renderer) => renderer,
                            None => Arc::new(ChromiumRenderer::new(config.client.timeout())),
                        };
                        Box::new(RenderedClient::new(renderer, settings))
                    }
                }
            }
        };

        let link_store: Box<dyn LinkStore> = match self.link_store {
            Some(store) => store,
            None => {
                if let Some(parent) = config.output.sqlite_path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                tracing::debug!("Opening link store at {:?}", config.output.sqlite_path);
                Box::new(SqliteLinkStore::new(&config.output.sqlite_path)?)
            }
        };

        let store: SharedLinkStore = Arc::new(Mutex::new(link_store));

        Ok(Crawler {
            provider: config.name.clone(),
            mode: config.mode,
            entry_urls: config.entry_urls.clone(),
            concurrency: config.client.concurrent_requests,
            discovery,
            on_item_crawled,
            store,
            data_store,
            client,
            progress_interval: self.progress_interval,
            phase: CrawlPhase::Init,
        })
    }
}
