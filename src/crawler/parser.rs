//! HTML extraction for links and page content
//!
//! This module handles parsing fetched HTML to extract:
//! - Same-site links to add to the frontier
//! - The page title and its visible text
//!
//! Neither extractor fails: html5ever repairs malformed markup, and anything
//! that cannot be recovered simply yields empty fields.

use crate::url::is_same_site;
use scraper::{Html, Node, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// Elements whose text content is never rendered
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// One crawled page: the unit of crawl output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// The URL the page was fetched from
    pub url: String,

    /// Text of the first `<title>` element, or empty
    pub title: String,

    /// Visible text, whitespace-normalized
    pub content: String,
}

/// Extracts all same-site links from an HTML document
///
/// Every `<a href>` is resolved against `base_url` (relative,
/// protocol-relative and absolute forms) and kept only if the result starts
/// with `site_root`.
///
/// # Example
///
/// ```
/// use wiki_scraper::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/a">A</a><a href="https://other/c">C</a>"#;
/// let base = Url::parse("https://site/").unwrap();
/// let links = extract_links(html, &base, "https://site");
/// assert!(links.contains("https://site/a"));
/// assert_eq!(links.len(), 1);
/// ```
pub fn extract_links(html: &str, base_url: &Url, site_root: &str) -> HashSet<String> {
    let document = Html::parse_document(html);
    let mut links = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                if is_same_site(&absolute_url, site_root) {
                    links.insert(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL
///
/// Returns None for empty hrefs and hrefs that cannot be joined onto the base.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    base_url.join(href).ok().map(|url| url.to_string())
}

/// Extracts the title and visible text of a page
///
/// # Example
///
/// ```
/// use wiki_scraper::crawler::extract_page;
///
/// let page = extract_page("<title>T</title><p>Hello</p>", "https://site/");
/// assert_eq!(page.title, "T");
/// ```
pub fn extract_page(html: &str, url: &str) -> PageRecord {
    let document = Html::parse_document(html);

    PageRecord {
        url: url.to_string(),
        title: extract_title(&document),
        content: extract_visible_text(&document),
    }
}

/// Extracts the first `<title>` element's text
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .unwrap_or_default()
}

/// Concatenates every visible text node with single spaces
fn extract_visible_text(document: &Html) -> String {
    let mut words: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
