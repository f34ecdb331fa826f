use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the URL has no host
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks that a string is a usable allowed-domain pattern
///
/// Accepts a plain hostname or a hostname prefixed with "*.". Labels may hold
/// ASCII letters, digits and hyphens and may not start or end with a hyphen.
/// `localhost` and IPv4 literals are accepted as plain hosts.
pub fn is_valid_domain_pattern(pattern: &str) -> bool {
    let host = pattern.strip_prefix("*.").unwrap_or(pattern);

    if host.is_empty() || host.len() > 253 {
        return false;
    }

    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
