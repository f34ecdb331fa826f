use url::Url;

/// Returns the origin of a URL as a base for resolving links
///
/// The origin keeps scheme, host and port; path, query and fragment are
/// dropped. `https://shop.com:8443/a/b?x=1` becomes `https://shop.com:8443/`.
pub fn origin_base(url: &Url) -> Option<Url> {
    let host = url.host_str()?;
    let origin = match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    };
    Url::parse(&origin).ok()
}

/// Resolves an href found on a page into an absolute http(s) URL
///
/// Returns None for empty hrefs, same-page anchors, `javascript:`, `mailto:`,
/// `tel:` and `data:` targets, unparsable values and non-http(s) schemes.
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Produces the canonical string form of a discovered link
///
/// # Normalization Steps
///
/// 1. Drop the fragment
/// 2. Drop the query when `strip_query` is set
/// 3. Remove one trailing slash from the serialized URL
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::canonicalize;
/// use url::Url;
///
/// let url = Url::parse("https://shop.com/item/?page=2#reviews").unwrap();
/// assert_eq!(canonicalize(&url, true), "https://shop.com/item");
/// assert_eq!(canonicalize(&url, false), "https://shop.com/item/?page=2");
/// ```
pub fn canonicalize(url: &Url, strip_query: bool) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    if strip_query {
        url.set_query(None);
    }

    let mut serialized = String::from(url);
    if serialized.ends_with('/') {
        serialized.pop();
    }
    serialized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.mydomain.com/deep/page?x=1").unwrap()
    }

    #[test]
    fn test_origin_base_drops_path_and_query() {
        let origin = origin_base(&base()).unwrap();
        assert_eq!(origin.as_str(), "https://www.mydomain.com/");
    }

    #[test]
    fn test_origin_base_keeps_port() {
        let url = Url::parse("http://127.0.0.1:4321/a/b").unwrap();
        let origin = origin_base(&url).unwrap();
        assert_eq!(origin.as_str(), "http://127.0.0.1:4321/");
    }

    #[test]
    fn test_resolve_root_relative() {
        let origin = origin_base(&base()).unwrap();
        let resolved = resolve_href("/valid/url3", &origin).unwrap();
        assert_eq!(resolved.as_str(), "https://www.mydomain.com/valid/url3");
    }

    #[test]
    fn test_resolve_absolute() {
        let origin = origin_base(&base()).unwrap();
        let resolved = resolve_href("https://otherdomain.com/something", &origin).unwrap();
        assert_eq!(resolved.host_str(), Some("otherdomain.com"));
    }

    #[test]
    fn test_resolve_skips_special_targets() {
        let origin = origin_base(&base()).unwrap();
        assert!(resolve_href("", &origin).is_none());
        assert!(resolve_href("   ", &origin).is_none());
        assert!(resolve_href("#top", &origin).is_none());
        assert!(resolve_href("javascript:void(0)", &origin).is_none());
        assert!(resolve_href("JavaScript:void(0)", &origin).is_none());
        assert!(resolve_href("mailto:a@b.com", &origin).is_none());
        assert!(resolve_href("tel:+123", &origin).is_none());
        assert!(resolve_href("data:text/html,hi", &origin).is_none());
        assert!(resolve_href("ftp://files.mydomain.com/x", &origin).is_none());
    }

    #[test]
    fn test_canonicalize_strips_query_and_fragment() {
        let url = Url::parse("https://www.mydomain.com/valid/url2?1234#frag").unwrap();
        assert_eq!(
            canonicalize(&url, true),
            "https://www.mydomain.com/valid/url2"
        );
        assert_eq!(
            canonicalize(&url, false),
            "https://www.mydomain.com/valid/url2?1234"
        );
    }

    #[test]
    fn test_canonicalize_trims_single_trailing_slash() {
        let root = Url::parse("https://www.mydomain.com").unwrap();
        assert_eq!(canonicalize(&root, true), "https://www.mydomain.com");

        let dir = Url::parse("https://www.mydomain.com/valid/").unwrap();
        assert_eq!(canonicalize(&dir, true), "https://www.mydomain.com/valid");
    }
}
