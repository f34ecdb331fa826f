//! URL handling module for Sumi-Harvest
//!
//! This module provides link resolution, canonicalization, host extraction
//! and allowed-domain matching.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, is_valid_domain_pattern};
pub use matcher::{host_allowed, matches_wildcard};
pub use normalize::{canonicalize, origin_base, resolve_href};

/// Returns true if the string parses as an absolute http(s) URL with a host
pub fn is_http_url(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
