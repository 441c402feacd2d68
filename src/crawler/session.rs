//! Per-run crawl session
//!
//! A session owns the fetch client (and through it the connection pool),
//! the cache of pages already extracted during discovery, and the
//! cancellation token. It is opened when a crawl starts and closed
//! explicitly on every exit path.

use crate::config::CrawlConfig;
use crate::crawler::fetcher::{FetchClient, HttpTransport, RetryPolicy, Transport};
use crate::crawler::parser::PageRecord;
use crate::ScraperError;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Resources held for the duration of one crawl
pub struct CrawlSession<T = HttpTransport> {
    fetcher: FetchClient<T>,
    page_cache: HashMap<String, PageRecord>,
    cancel: CancellationToken,
}

impl CrawlSession<HttpTransport> {
    /// Opens a session backed by a real HTTP client
    ///
    /// Failing to build the client is fatal for the crawl: nothing can be
    /// fetched without it.
    pub fn open(config: &CrawlConfig) -> Result<Self, ScraperError> {
        let transport = HttpTransport::from_config(config).map_err(ScraperError::ClientBuild)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> CrawlSession<T> {
    /// Opens a session over an arbitrary transport
    pub fn with_transport(transport: T, config: &CrawlConfig) -> Self {
        tracing::debug!(
            "Opening crawl session (max_concurrent={}, retries={})",
            config.max_concurrent,
            config.max_retries
        );
        Self {
            fetcher: FetchClient::new(
                transport,
                config.max_concurrent,
                RetryPolicy::from_config(config),
            ),
            page_cache: HashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn fetcher(&self) -> &FetchClient<T> {
        &self.fetcher
    }

    /// Replaces the session's cancellation token with an external one
    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    /// Returns a handle that stops the crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stores a page extracted during discovery
    pub fn cache_page(&mut self, record: PageRecord) {
        self.page_cache.insert(record.url.clone(), record);
    }

    /// Removes and returns a cached page
    pub fn take_cached(&mut self, url: &str) -> Option<PageRecord> {
        self.page_cache.remove(url)
    }

    pub fn cached_count(&self) -> usize {
        self.page_cache.len()
    }

    /// Removes every cached page, sorted by URL
    pub fn drain_cache(&mut self) -> Vec<PageRecord> {
        let mut records: Vec<PageRecord> = self.page_cache.drain().map(|(_, r)| r).collect();
        records.sort_by(|a, b| a.url.cmp(&b.url));
        records
    }

    /// Closes the session and releases its connections
    ///
    /// Returns the number of cached pages that were never collected.
    pub fn close(self) -> usize {
        self.fetcher.close();
        let leftover = self.page_cache.len();
        tracing::debug!("Crawl session closed ({} uncollected cached pages)", leftover);
        leftover
    }
}
