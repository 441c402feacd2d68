//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client from the crawl configuration
//! - Classifying failures into timeout, bad status and transport errors
//! - Admission control: a counting gate caps simultaneous requests
//! - Bounded retry with a fixed backoff

use crate::config::CrawlConfig;
use crate::FetchError;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Something that can GET a URL and return its body
///
/// The production implementation is [`HttpTransport`]. Tests substitute
/// instrumented transports to observe concurrency and failure handling.
pub trait Transport: Send + Sync {
    /// Performs a single GET request
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Future<Output = Result<String, FetchError>> + Send + 'a;
}

/// Transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Wraps an already-built client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client described by `config` and wraps it
    pub fn from_config(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

impl Transport for HttpTransport {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Future<Output = Result<String, FetchError>> + Send + 'a {
        async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(&e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::BadStatus(status.as_u16()));
            }

            response.text().await.map_err(|e| FetchError::from_reqwest(&e))
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .pool_max_idle_per_host(config.max_concurrent)
        .gzip(true)
        .brotli(true);

    if !config.tls_verify {
        // Accepts any certificate, including self-signed and expired ones, so
        // wikis with broken TLS setups stay reachable. Traffic can then be
        // intercepted by anyone on the path; set `tls-verify = true` to refuse.
        tracing::warn!("TLS certificate verification is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build()
}

/// Retry behavior for failed fetches
///
/// Only timeouts, transport failures and 5xx responses are retried (see
/// [`FetchError::is_retryable`]). A 4xx fails on the first attempt whatever
/// `max_retries` says, so a policy of three retries still gives up on a 404
/// immediately instead of sleeping through every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one (0 = no retry)
    pub max_retries: u32,

    /// Fixed delay between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, no retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: config.retry_delay(),
        }
    }
}

/// Fetch client with admission control and retry
///
/// At most `max_concurrent` requests are in flight at once; extra callers
/// wait for a slot. The slot is released while waiting out a retry delay.
pub struct FetchClient<T> {
    transport: T,
    gate: Arc<Semaphore>,
    max_concurrent: usize,
    retry: RetryPolicy,
}

impl<T: Transport> FetchClient<T> {
    /// Creates a new fetch client
    ///
    /// # Arguments
    ///
    /// * `transport` - The transport used for each request
    /// * `max_concurrent` - Ceiling on simultaneous in-flight requests
    /// * `retry` - Retry behavior for retryable failures
    pub fn new(transport: T, max_concurrent: usize, retry: RetryPolicy) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            transport,
            gate: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            retry,
        }
    }

    /// Fetches a URL, retrying retryable failures per the policy
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body |
    /// | HTTP 4xx | Immediate → BadStatus |
    /// | HTTP 5xx | Retry up to `max_retries` times |
    /// | Timeout | Retry up to `max_retries` times |
    /// | Transport failure | Retry up to `max_retries` times |
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;

        loop {
            let result = {
                let _permit = self
                    .gate
                    .acquire()
                    .await
                    .map_err(|_| FetchError::Transport("fetch client is closed".to_string()))?;
                self.transport.get(url).await
            };

            match result {
                Ok(body) => return Ok(body),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Fetch of {} failed ({}), retry {}/{}",
                        url,
                        err,
                        attempt,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(err) => {
                    if attempt > 0 {
                        tracing::warn!("Failed to fetch {} after {} attempts", url, attempt + 1);
                    }
                    return Err(err);
                }
            }
        }
    }

    /// The configured concurrency ceiling
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of requests currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.gate.available_permits()
    }

    /// Rejects all further fetches; requests already admitted finish normally
    pub fn close(&self) {
        self.gate.close();
    }

    /// Returns the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
