//! Headless Chromium renderer built on chromiumoxide

use crate::fetch::rendered::{RenderOptions, RenderTarget, Rendered, Renderer};
use crate::fetch::{FetchError, FetchRequest};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Resolves once the number of loaded resources has been stable for ~500ms
const NETWORK_IDLE_SCRIPT: &str = r#"
new Promise((resolve) => {
    let last = -1;
    let stable = 0;
    const tick = () => {
        const count = performance.getEntriesByType('resource').length;
        if (count === last) { stable += 1; } else { stable = 0; last = count; }
        if (stable >= 5) { resolve(true); } else { setTimeout(tick, 100); }
    };
    tick();
})
"#;

/// Scrolls down in 100px steps until the bottom of the document is reached
const AUTO_SCROLL_SCRIPT: &str = r#"
new Promise((resolve) => {
    let scrolled = 0;
    const step = 100;
    const timer = setInterval(() => {
        const height = document.body.scrollHeight;
        window.scrollBy(0, step);
        scrolled += step;
        if (scrolled >= height - window.innerHeight) {
            clearInterval(timer);
            resolve(true);
        }
    }, 100);
})
"#;

/// Launches a local headless Chromium and opens one tab per target
pub struct ChromiumRenderer {
    request_timeout: Duration,
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumRenderer {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            browser: Mutex::new(None),
            handler: Mutex::new(None),
        }
    }
}

fn render_error(err: impl std::fmt::Display) -> FetchError {
    FetchError::Render(err.to_string())
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn launch(&self) -> Result<(), FetchError> {
        let mut browser_slot = self.browser.lock().await;
        if browser_slot.is_some() {
            return Ok(());
        }

        let config = BrowserConfig::builder()
            .request_timeout(self.request_timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(FetchError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        tracing::info!("Launched headless browser");
        *browser_slot = Some(browser);
        *self.handler.lock().await = Some(task);
        Ok(())
    }

    async fn open_target(&self) -> Result<Box<dyn RenderTarget>, FetchError> {
        let browser = self.browser.lock().await;
        let browser = browser.as_ref().ok_or(FetchError::PoolClosed)?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;
        Ok(Box::new(ChromiumTarget { page }))
    }

    async fn shutdown(&self) -> Result<(), FetchError> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            browser.close().await.map_err(render_error)?;
            if let Err(e) = browser.wait().await {
                tracing::warn!("Browser process did not exit cleanly: {}", e);
            }
        }

        if let Some(task) = self.handler.lock().await.take() {
            task.abort();
        }

        tracing::info!("Browser closed");
        Ok(())
    }
}

/// A single browser tab
struct ChromiumTarget {
    page: Page,
}

impl ChromiumTarget {
    async fn apply_headers(&self, request: &FetchRequest) -> Result<(), FetchError> {
        if let Some(user_agent) = request.user_agent() {
            self.page
                .set_user_agent(user_agent)
                .await
                .map_err(render_error)?;
        }

        let extra: serde_json::Map<String, serde_json::Value> = request
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("user-agent"))
            .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
            .collect();

        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(
                serde_json::Value::Object(extra),
            )))
            .await
            .map_err(render_error)?;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<(), FetchError> {
        self.page.goto(url).await.map_err(render_error)?;
        self.page
            .evaluate(NETWORK_IDLE_SCRIPT)
            .await
            .map_err(render_error)?;
        Ok(())
    }
}

#[async_trait]
impl RenderTarget for ChromiumTarget {
    async fn render(
        &self,
        request: &FetchRequest,
        options: &RenderOptions,
    ) -> Result<Rendered, FetchError> {
        self.apply_headers(request).await?;

        tokio::time::timeout(options.timeout, self.navigate(&request.url))
            .await
            .map_err(|_| FetchError::Timeout)??;

        if options.auto_scroll {
            match tokio::time::timeout(options.timeout, self.page.evaluate(AUTO_SCROLL_SCRIPT)).await
            {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!("Auto-scroll failed on {}: {}", request.url, e),
                Err(_) => tracing::warn!("Auto-scroll timed out on {}", request.url),
            }
        }

        tokio::time::sleep(options.settle_delay).await;

        let html = self.page.content().await.map_err(render_error)?;
        Ok(Rendered { status: 200, html })
    }

    async fn close(self: Box<Self>) -> Result<(), FetchError> {
        self.page.close().await.map_err(render_error)
    }
}
