use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Provider name used when the config does not set one
pub const DEFAULT_NAME: &str = "sumi-harvest";

/// Desktop Chrome user agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/103.0.0.0 Safari/537.36";

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Provider name; isolates this crawl's frontier and data
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub mode: CrawlMode,

    /// URLs the frontier is seeded with
    #[serde(rename = "entry-urls")]
    pub entry_urls: Vec<String>,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Field name to CSS selector, used by the CLI's selector extractor
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extract: BTreeMap<String, String>,
}

impl Config {
    /// Creates a configuration with defaults for everything but the entry URLs
    pub fn new<I, S>(entry_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: default_name(),
            mode: CrawlMode::default(),
            entry_urls: entry_urls.into_iter().map(Into::into).collect(),
            client: ClientConfig::default(),
            discovery: DiscoveryConfig::default(),
            output: OutputConfig::default(),
            extract: BTreeMap::new(),
        }
    }

    /// Returns the effective domain allow-list
    ///
    /// Falls back to the lowercase hosts of the entry URLs when the
    /// configuration does not name any domains.
    pub fn allowed_domains(&self) -> Vec<String> {
        if let Some(domains) = &self.discovery.allowed_domains {
            return domains.iter().map(|d| d.to_lowercase()).collect();
        }

        let mut hosts: Vec<String> = self
            .entry_urls
            .iter()
            .filter_map(|u| url::Url::parse(u).ok())
            .filter_map(|u| crate::url::extract_domain(&u))
            .collect();
        hosts.sort();
        hosts.dedup();
        hosts
    }
}

/// What happens to an existing frontier when a crawl starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlMode {
    /// Delete the provider's links before seeding
    #[default]
    StartFromScratch,

    /// Resume the existing frontier as-is
    Continue,
}

/// Which fetch backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Plain HTTP requests
    #[default]
    Direct,

    /// Headless browser rendering
    Rendered,
}

/// Fetch client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Maximum number of fetches in flight
    #[serde(rename = "concurrent-requests", default = "default_concurrency")]
    pub concurrent_requests: usize,

    /// Retries after the first failed attempt
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Seconds to wait between attempts on the same URL
    #[serde(rename = "retry-delay", default = "default_retry_delay")]
    pub retry_delay: f64,

    /// Minimum seconds between two requests on the same lane
    #[serde(
        rename = "delay-between-requests",
        default = "default_delay_between_requests"
    )]
    pub delay_between_requests: f64,

    #[serde(rename = "timeout-seconds", default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub backend: Backend,

    /// Scroll rendered pages to the bottom to trigger lazy loading
    #[serde(rename = "auto-scroll-to-bottom", default = "default_true")]
    pub auto_scroll_to_bottom: bool,
}

impl ClientConfig {
    pub fn retry_delay(&self) -> Duration {
        seconds(self.retry_delay)
    }

    pub fn delay_between_requests(&self) -> Duration {
        seconds(self.delay_between_requests)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            concurrent_requests: default_concurrency(),
            retries: default_retries(),
            retry_delay: default_retry_delay(),
            delay_between_requests: default_delay_between_requests(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            backend: Backend::default(),
            auto_scroll_to_bottom: true,
        }
    }
}

/// Link discovery filters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Allowed hosts; "*.example.com" also admits example.com and subdomains
    #[serde(
        rename = "allowed-domains",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed_domains: Option<Vec<String>>,

    /// URL patterns, each tried as a regex and as a plain substring
    #[serde(rename = "allowed-path", default = "default_allowed_path")]
    pub allowed_path: Vec<String>,

    #[serde(rename = "remove-query-params", default = "default_true")]
    pub remove_query_params: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            allowed_domains: None,
            allowed_path: default_allowed_path(),
            remove_query_params: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory the default file data store writes into
    #[serde(rename = "data-path", default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,

    /// Records per output file
    #[serde(rename = "data-batch-size", default = "default_batch_size")]
    pub data_batch_size: usize,

    /// Path to the SQLite frontier database
    #[serde(rename = "sqlite-path", default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            data_batch_size: default_batch_size(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_concurrency() -> usize {
    1
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> f64 {
    5.0
}

fn default_delay_between_requests() -> f64 {
    2.0
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_allowed_path() -> Vec<String> {
    vec![".*".to_string()]
}

fn default_batch_size() -> usize {
    50
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./cache.sqlite")
}
