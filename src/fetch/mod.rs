//! Fetch layer
//!
//! Pooled concurrent fetchers with retry, a fixed retry delay and per-lane
//! throttling. Two interchangeable backends implement [`FetchClient`]:
//! - [`DirectClient`]: plain HTTP through reqwest
//! - [`RenderedClient`]: a pool of headless browser tabs

mod chromium;
mod direct;
mod pool;
mod rendered;
mod retry;
mod throttle;

pub use chromium::ChromiumRenderer;
pub use direct::DirectClient;
pub use pool::{PoolGuard, WorkerPool};
pub use rendered::{RenderOptions, RenderTarget, Rendered, RenderedClient, Renderer};
pub use retry::RetryPolicy;
pub use throttle::Throttle;

use crate::config::ClientConfig;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Rewrites a request before each attempt
pub type RequestHook = Arc<dyn Fn(FetchRequest) -> FetchRequest + Send + Sync>;

/// Errors raised while fetching a single URL or managing a client
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Render error: {0}")]
    Render(String),

    #[error("Worker pool is closed")]
    PoolClosed,

    #[error("Failed to launch fetch backend: {0}")]
    Launch(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// A single outgoing request, as seen by the `before_request` hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl FetchRequest {
    /// Creates a request carrying only a `User-Agent` header
    pub fn new(url: impl Into<String>, user_agent: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), user_agent.to_string());
        Self {
            url: url.into(),
            headers,
        }
    }

    /// Returns the `User-Agent` header, matched case-insensitively
    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map(|(_, value)| value.as_str())
    }
}

/// Content of a successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The URL that was requested
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl Page {
    /// Parses the body as an HTML document
    pub fn html(&self) -> scraper::Html {
        scraper::Html::parse_document(&self.body)
    }
}

/// Outcome of fetching one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Always the URL that was requested, even if a hook rewrote it
    pub url: String,
    pub success: bool,
    pub page: Option<Page>,
}

impl FetchResult {
    pub fn succeeded(url: impl Into<String>, status: u16, body: String) -> Self {
        let url = url.into();
        Self {
            page: Some(Page {
                url: url.clone(),
                status,
                body,
            }),
            url,
            success: true,
        }
    }

    pub fn failed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            page: None,
        }
    }
}

/// Settings shared by both fetch backends
#[derive(Clone)]
pub struct ClientSettings {
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub delay_between_requests: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    pub auto_scroll: bool,
    pub before_request: Option<RequestHook>,
}

impl ClientSettings {
    /// Builds settings from the `[client]` configuration section
    pub fn from_config(config: &ClientConfig, before_request: Option<RequestHook>) -> Self {
        Self {
            concurrency: config.concurrent_requests.max(1),
            retry: RetryPolicy {
                retries: config.retries,
                delay: config.retry_delay(),
            },
            delay_between_requests: config.delay_between_requests(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            auto_scroll: config.auto_scroll_to_bottom,
            before_request,
        }
    }

    /// Builds the request for one attempt from a fresh copy of the original
    pub fn prepare_request(&self, url: &str) -> FetchRequest {
        let request = FetchRequest::new(url, &self.user_agent);
        match &self.before_request {
            Some(hook) => hook(request),
            None => request,
        }
    }
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("concurrency", &self.concurrency)
            .field("retry", &self.retry)
            .field("delay_between_requests", &self.delay_between_requests)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("auto_scroll", &self.auto_scroll)
            .field("before_request", &self.before_request.is_some())
            .finish()
    }
}

/// A pooled page fetcher
///
/// `get` never fails: every requested URL yields exactly one [`FetchResult`]
/// in input order, with failures reported as `success == false`.
#[async_trait]
pub trait FetchClient: Send + Sync {
    /// Prepares the backend; must be called before `get`
    async fn initialize(&self) -> Result<(), FetchError>;

    /// Fetches every URL, returning one result per input in the same order
    async fn get(&self, urls: &[String]) -> Vec<FetchResult>;

    /// Waits for in-flight work, then releases backend resources
    async fn shutdown(&self) -> Result<(), FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_user_agent() {
        let request = FetchRequest::new("https://shop.com", "Agent/1.0");
        assert_eq!(request.user_agent(), Some("Agent/1.0"));
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_prepare_request_applies_hook_to_fresh_copy() {
        let hook: RequestHook = Arc::new(|mut req: FetchRequest| {
            req.url.push_str("?page=1");
            req.headers.insert("X-Token".to_string(), "abc".to_string());
            req
        });
        let settings = ClientSettings::from_config(&ClientConfig::default(), Some(hook));

        let first = settings.prepare_request("https://shop.com/a");
        let second = settings.prepare_request("https://shop.com/a");

        assert_eq!(first.url, "https://shop.com/a?page=1");
        assert_eq!(first, second);
        assert_eq!(first.headers.get("X-Token").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_result_constructors() {
        let ok = FetchResult::succeeded("https://shop.com", 200, "<html></html>".to_string());
        assert!(ok.success);
        assert_eq!(ok.page.as_ref().map(|p| p.url.as_str()), Some("https://shop.com"));

        let failed = FetchResult::failed("https://shop.com/x");
        assert!(!failed.success);
        assert!(failed.page.is_none());
    }

    #[test]
    fn test_page_html_parses() {
        let page = Page {
            url: "https://shop.com".to_string(),
            status: 200,
            body: "<html><head><title>Shop</title></head></html>".to_string(),
        };
        let selector = scraper::Selector::parse("title").unwrap();
        let html = page.html();
        let title: String = html.select(&selector).next().unwrap().text().collect();
        assert_eq!(title, "Shop");
    }
}
