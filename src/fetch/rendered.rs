//! Rendered backend
//!
//! Pages are loaded in a pool of headless browser targets (tabs). Each URL
//! holds one target exclusively for its whole retry sequence.

use crate::fetch::{
    ClientSettings, FetchClient, FetchError, FetchRequest, FetchResult, WorkerPool,
};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Per-attempt rendering options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Upper bound for navigation and network-idle waiting
    pub timeout: Duration,
    /// Scroll to the bottom after load to trigger lazy content
    pub auto_scroll: bool,
    /// Pause after load before the HTML is read
    pub settle_delay: Duration,
}

/// HTML captured from a rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub status: u16,
    pub html: String,
}

/// One automation target, usually a browser tab
#[async_trait]
pub trait RenderTarget: Send + Sync {
    /// Navigates to the request URL and returns the final HTML
    ///
    /// Implementations apply the request headers (including `User-Agent`),
    /// bound navigation by `options.timeout`, optionally scroll, then wait
    /// `options.settle_delay` before reading the document.
    async fn render(
        &self,
        request: &FetchRequest,
        options: &RenderOptions,
    ) -> Result<Rendered, FetchError>;

    /// Closes the target
    async fn close(self: Box<Self>) -> Result<(), FetchError>;
}

/// Automation backend that hands out render targets
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Starts the backend (for example launches the browser)
    async fn launch(&self) -> Result<(), FetchError>;

    /// Opens a fresh target
    async fn open_target(&self) -> Result<Box<dyn RenderTarget>, FetchError>;

    /// Stops the backend; called after every target is closed
    async fn shutdown(&self) -> Result<(), FetchError>;
}

type TargetPool = WorkerPool<Box<dyn RenderTarget>>;

/// Fetch client rendering pages through a pool of browser targets
pub struct RenderedClient {
    renderer: Arc<dyn Renderer>,
    settings: ClientSettings,
    pool: Mutex<Option<Arc<TargetPool>>>,
}

impl RenderedClient {
    pub fn new(renderer: Arc<dyn Renderer>, settings: ClientSettings) -> Self {
        Self {
            renderer,
            settings,
            pool: Mutex::new(None),
        }
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            timeout: self.settings.timeout,
            auto_scroll: self.settings.auto_scroll,
            settle_delay: self.settings.delay_between_requests,
        }
    }

    fn current_pool(&self) -> Option<Arc<TargetPool>> {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Closes whatever a failed `initialize` already opened
    async fn abandon_start(&self, targets: Vec<Box<dyn RenderTarget>>) {
        for target in targets {
            if let Err(e) = target.close().await {
                tracing::warn!("Failed to close render target: {}", e);
            }
        }
        if let Err(e) = self.renderer.shutdown().await {
            tracing::warn!("Renderer shutdown after failed start: {}", e);
        }
    }

    async fn fetch_one(&self, pool: &TargetPool, url: &str) -> FetchResult {
        let guard = match pool.acquire().await {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("No render target for {}: {}", url, e);
                return FetchResult::failed(url);
            }
        };
        let target: &dyn RenderTarget = &**guard;
        let options = self.render_options();
        let settings = &self.settings;

        let outcome = settings
            .retry
            .run(url, |attempt| async move {
                let request = settings.prepare_request(url);
                tracing::debug!(attempt, "Rendering {}", request.url);
                target.render(&request, &options).await
            })
            .await;

        match outcome {
            Ok(rendered) => FetchResult::succeeded(url, rendered.status, rendered.html),
            Err(_) => FetchResult::failed(url),
        }
    }
}

#[async_trait]
impl FetchClient for RenderedClient {
    async fn initialize(&self) -> Result<(), FetchError> {
        if self.current_pool().is_some() {
            return Ok(());
        }

        self.renderer.launch().await?;

        let mut targets = Vec::with_capacity(self.settings.concurrency);
        for _ in 0..self.settings.concurrency.max(1) {
            match self.renderer.open_target().await {
                Ok(target) => targets.push(target),
                Err(e) => {
                    tracing::error!("Failed to open render target: {}", e);
                    self.abandon_start(targets).await;
                    return Err(e);
                }
            }
        }

        tracing::info!("Opened {} render targets", targets.len());
        *self.pool.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::new(WorkerPool::new(targets)));
        Ok(())
    }

    async fn get(&self, urls: &[String]) -> Vec<FetchResult> {
        let Some(pool) = self.current_pool() else {
            tracing::error!("Rendered client used before initialize");
            return urls.iter().map(|url| FetchResult::failed(url.as_str())).collect();
        };

        join_all(urls.iter().map(|url| self.fetch_one(&pool, url))).await
    }

    async fn shutdown(&self) -> Result<(), FetchError> {
        let pool = self
            .pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(pool) = pool else {
            return Ok(());
        };

        let targets = pool.drain().await?;
        tracing::debug!("Closing {} render targets", targets.len());
        for target in targets {
            if let Err(e) = target.close().await {
                tracing::warn!("Failed to close render target: {}", e);
            }
        }

        self.renderer.shutdown().await
    }
}
