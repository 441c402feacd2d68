use serde::Deserialize;
use std::time::Duration;

/// Default start URL used by the command-line tool
pub const DEFAULT_START_URL: &str = "https://mafiagame.gitbook.io/bnb-mafia";

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CrawlConfig {
    /// Maximum number of simultaneous in-flight requests
    pub max_concurrent: usize,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Number of frontier URLs expanded per discovery round
    pub discovery_batch_size: usize,

    /// Number of URLs fetched per batch in the fetch phase
    /// (defaults to twice `max_concurrent`)
    pub fetch_batch_size: Option<usize>,

    /// Whether TLS certificates are validated
    pub tls_verify: bool,

    /// Extra attempts after a retryable failure (0 = single attempt)
    pub max_retries: u32,

    /// Fixed delay between retry attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Pause between batches (milliseconds)
    pub batch_delay_ms: u64,

    /// Keep pages fetched during discovery instead of fetching them again
    pub reuse_discovery_fetches: bool,

    /// Drop fragments and trailing slashes from discovered links
    pub normalize_links: bool,

    /// Same-site prefix; the start URL is used when unset
    pub site_root: Option<String>,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            timeout_seconds: 10,
            discovery_batch_size: 10,
            fetch_batch_size: None,
            tls_verify: false,
            max_retries: 0,
            retry_delay_ms: 1000,
            batch_delay_ms: 10,
            reuse_discovery_fetches: true,
            normalize_links: false,
            site_root: None,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CrawlConfig {
    /// Batch size used once discovery has finished
    pub fn effective_fetch_batch_size(&self) -> usize {
        self.fetch_batch_size
            .unwrap_or(self.max_concurrent.saturating_mul(2))
            .max(1)
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Delay between retry attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Politeness pause between batches
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Resolves the same-site prefix for a crawl starting at `start_url`
    pub fn site_root_for<'a>(&'a self, start_url: &'a str) -> &'a str {
        self.site_root.as_deref().unwrap_or(start_url)
    }
}
