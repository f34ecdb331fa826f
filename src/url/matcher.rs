/// Checks if a host matches an allowed-domain pattern
///
/// Two pattern forms are accepted:
/// 1. Exact: "shop.example.com" matches only "shop.example.com"
/// 2. Wildcard: "*.example.com" matches "example.com" and any subdomain
///    at any depth
///
/// # Arguments
///
/// * `pattern` - The domain pattern, optionally starting with "*."
/// * `candidate` - The lowercase host to check
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("www.mydomain.com", "www.mydomain.com"));
/// assert!(!matches_wildcard("www.mydomain.com", "mydomain.com"));
/// assert!(matches_wildcard("*.mydomain.com", "mydomain.com"));
/// assert!(matches_wildcard("*.mydomain.com", "cdn.eu.mydomain.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .map_or(false, |prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Returns true if any pattern in the allow-list matches the host
pub fn host_allowed<S: AsRef<str>>(patterns: &[S], host: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| matches_wildcard(pattern.as_ref(), host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pattern() {
        assert!(matches_wildcard("www.mydomain.com", "www.mydomain.com"));
        assert!(!matches_wildcard("www.mydomain.com", "mydomain.com"));
        assert!(!matches_wildcard("www.mydomain.com", "otherdomain.com"));
    }

    #[test]
    fn test_wildcard_matches_apex_and_subdomains() {
        assert!(matches_wildcard("*.mydomain.com", "mydomain.com"));
        assert!(matches_wildcard("*.mydomain.com", "www.mydomain.com"));
        assert!(matches_wildcard("*.mydomain.com", "a.b.mydomain.com"));
    }

    #[test]
    fn test_wildcard_rejects_lookalikes() {
        assert!(!matches_wildcard("*.mydomain.com", "notmydomain.com"));
        assert!(!matches_wildcard("*.mydomain.com", "mydomain.com.evil.org"));
        assert!(!matches_wildcard("*.mydomain.com", ""));
    }

    #[test]
    fn test_host_allowed() {
        let patterns = vec!["shop.example.com".to_string(), "*.cdn.net".to_string()];
        assert!(host_allowed(&patterns, "shop.example.com"));
        assert!(host_allowed(&patterns, "img.cdn.net"));
        assert!(!host_allowed(&patterns, "example.com"));

        let empty: Vec<String> = Vec::new();
        assert!(!host_allowed(&empty, "example.com"));
    }
}
