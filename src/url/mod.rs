//! URL handling module for Wiki-Scraper
//!
//! This module provides the same-site test used to keep a crawl on one wiki
//! and the optional link normalization.

mod normalize;

pub use normalize::normalize_link;

/// Returns true if `url` belongs to the site rooted at `site_root`
///
/// This is a plain string-prefix test. Trailing slashes, query strings and
/// fragments are not normalized here, so `root/x` and `root/x/` are
/// distinct URLs.
///
/// # Examples
///
/// ```
/// use wiki_scraper::url::is_same_site;
///
/// assert!(is_same_site("https://site/a", "https://site"));
/// assert!(!is_same_site("https://other/c", "https://site"));
/// ```
pub fn is_same_site(url: &str, site_root: &str) -> bool {
    url.starts_with(site_root)
}
