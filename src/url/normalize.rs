use url::Url;

/// Normalizes a discovered link before it enters the frontier
///
/// # Normalization Steps
///
/// 1. Parse the URL; return the input unchanged if it is not absolute
/// 2. Remove the fragment (everything after #)
/// 3. Remove the trailing slash from non-root paths
///
/// Query strings are kept as-is since wiki engines often route on them.
///
/// # Examples
///
/// ```
/// use wiki_scraper::url::normalize_link;
///
/// assert_eq!(normalize_link("https://wiki.test/page/#intro"), "https://wiki.test/page");
/// ```
pub fn normalize_link(link: &str) -> String {
    let mut url = match Url::parse(link) {
        Ok(url) => url,
        Err(_) => return link.to_string(),
    };

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
        url.set_path(&trimmed);
    }

    url.to_string()
}
