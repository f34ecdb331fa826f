//! Link discovery
//!
//! Extracts outbound links from a fetched page and filters them:
//! - `<a href>` targets resolved against the page origin, http(s) only
//! - hosts must match the allowed-domain list (wildcards supported)
//! - query stripped when configured, fragment always dropped
//! - one trailing slash removed
//! - URL must match at least one allowed-path pattern (regex or substring)

use crate::config::Config;
use crate::fetch::Page;
use crate::url::{canonicalize, extract_domain, host_allowed, origin_base, resolve_href};
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use scraper::Selector;
use std::collections::BTreeSet;
use std::sync::Arc;
use url::Url;

/// Post-processes the filtered links of a page
pub type LinksHook = Arc<dyn Fn(&Page, Vec<String>) -> Vec<String> + Send + Sync>;

/// An allowed-path entry, matched as a regex or as a plain substring
#[derive(Debug, Clone)]
struct PathPattern {
    raw: String,
    regex: Regex,
}

impl PathPattern {
    fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url) || url.contains(&self.raw)
    }
}

/// Extracts and filters links from pages
pub struct LinkDiscovery {
    allowed_domains: Vec<String>,
    allowed_paths: Vec<PathPattern>,
    remove_query_params: bool,
    anchors: Selector,
    on_links_discovered: Option<LinksHook>,
}

impl LinkDiscovery {
    /// Creates a discovery filter
    ///
    /// # Arguments
    ///
    /// * `allowed_domains` - Host patterns; "*.example.com" also admits the apex
    /// * `allowed_path` - Patterns tried as regex and as substring, OR-combined
    /// * `remove_query_params` - Strip the query component from links
    ///
    /// # Returns
    ///
    /// * `Ok(LinkDiscovery)` - Ready to extract links
    /// * `Err(ConfigError::InvalidPattern)` - A path pattern is not a valid regex
    pub fn new(
        allowed_domains: Vec<String>,
        allowed_path: &[String],
        remove_query_params: bool,
    ) -> ConfigResult<Self> {
        let allowed_paths = allowed_path
            .iter()
            .map(|raw| {
                Regex::new(raw)
                    .map(|regex| PathPattern {
                        raw: raw.clone(),
                        regex,
                    })
                    .map_err(|e| {
                        ConfigError::InvalidPattern(format!("Invalid allowed-path '{}': {}", raw, e))
                    })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        let anchors = Selector::parse("a[href]")
            .map_err(|e| ConfigError::InvalidPattern(format!("{:?}", e)))?;

        Ok(Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|d| d.to_lowercase())
                .collect(),
            allowed_paths,
            remove_query_params,
            anchors,
            on_links_discovered: None,
        })
    }

    /// Builds the filter from the `[discovery]` section and the entry URLs
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        Self::new(
            config.allowed_domains(),
            &config.discovery.allowed_path,
            config.discovery.remove_query_params,
        )
    }

    /// Installs the hook that gets the final say over each page's links
    pub fn with_links_hook(mut self, hook: Option<LinksHook>) -> Self {
        self.on_links_discovered = hook;
        self
    }

    /// Returns the deduplicated, filtered links found on a page
    pub fn extract_links(&self, page: &Page) -> BTreeSet<String> {
        let links = match self.filtered_links(page) {
            Some(links) => links,
            None => {
                tracing::warn!("Cannot resolve links on page with URL {}", page.url);
                BTreeSet::new()
            }
        };

        match &self.on_links_discovered {
            Some(hook) => hook(page, links.into_iter().collect())
                .into_iter()
                .collect(),
            None => links,
        }
    }

    fn filtered_links(&self, page: &Page) -> Option<BTreeSet<String>> {
        let page_url = Url::parse(&page.url).ok()?;
        let base = origin_base(&page_url)?;
        let document = page.html();

        let links = document
            .select(&self.anchors)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter_map(|href| resolve_href(href, &base))
            .filter(|url| {
                extract_domain(url)
                    .map(|host| host_allowed(&self.allowed_domains, &host))
                    .unwrap_or(false)
            })
            .map(|url| canonicalize(&url, self.remove_query_params))
            .filter(|url| self.path_allowed(url))
            .collect();

        Some(links)
    }

    fn path_allowed(&self, url: &str) -> bool {
        self.allowed_paths.iter().any(|pattern| pattern.matches(url))
    }
}

impl std::fmt::Debug for LinkDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkDiscovery")
            .field("allowed_domains", &self.allowed_domains)
            .field(
                "allowed_paths",
                &self.allowed_paths.iter().map(|p| &p.raw).collect::<Vec<_>>(),
            )
            .field("remove_query_params", &self.remove_query_params)
            .field("on_links_discovered", &self.on_links_discovered.is_some())
            .finish()
    }
}
