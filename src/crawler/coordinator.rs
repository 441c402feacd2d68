//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives a crawl through its phases:
//! - Discovering: breadth-wise frontier expansion in bounded batches
//! - Fetching: retrieving every discovered page not already in hand
//! - Extracting: streaming the finished page records to listeners
//!
//! All crawl state (frontier, cache, results) is owned by the coordinator
//! and only mutated between batches, after every fetch in the batch has
//! completed.

use crate::config::{validate, CrawlConfig};
use crate::crawler::events::{CrawlEvent, CrawlPhase, EventReceiver, EventSender, ProgressEvent};
use crate::crawler::fetcher::{HttpTransport, Transport};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{extract_links, extract_page, PageRecord};
use crate::crawler::session::CrawlSession;
use crate::output::CrawlSummary;
use crate::url::normalize_link;
use crate::{FetchError, ScraperError};
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator<T = HttpTransport> {
    config: CrawlConfig,
    session: CrawlSession<T>,
    events: Option<EventSender>,
    phase: CrawlPhase,
}

/// Bookkeeping for one run
#[derive(Default)]
struct RunState {
    failed: HashSet<String>,
    discovered: usize,
    cancelled: bool,
}

impl Coordinator<HttpTransport> {
    /// Creates a coordinator with a real HTTP session
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScraperError)` - Invalid configuration or HTTP client failure
    pub fn new(config: CrawlConfig) -> Result<Self, ScraperError> {
        validate(&config)?;
        let session = CrawlSession::open(&config)?;
        Ok(Self::from_session(config, session))
    }
}

impl<T: Transport> Coordinator<T> {
    /// Creates a coordinator over a custom transport
    pub fn with_transport(config: CrawlConfig, transport: T) -> Result<Self, ScraperError> {
        validate(&config)?;
        let session = CrawlSession::with_transport(transport, &config);
        Ok(Self::from_session(config, session))
    }

    fn from_session(config: CrawlConfig, session: CrawlSession<T>) -> Self {
        Self {
            config,
            session,
            events: None,
            phase: CrawlPhase::Idle,
        }
    }

    /// Attaches a listener for crawl events
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Uses an external token to stop the crawl
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.session.set_cancellation(token);
        self
    }

    /// Returns a handle that stops the crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.session.cancellation_token()
    }

    /// Runs the crawl to completion
    ///
    /// The session is closed on every exit path. A cancelled crawl returns
    /// `Ok` with the pages extracted so far.
    ///
    /// # Arguments
    ///
    /// * `start_url` - Absolute http(s) URL to start from
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PageRecord>)` - One record per successfully fetched page
    /// * `Err(ScraperError)` - Invalid or unreachable start URL
    pub async fn run(mut self, start_url: &str) -> Result<Vec<PageRecord>, ScraperError> {
        let outcome = self.crawl(start_url).await;

        if let Err(e) = &outcome {
            tracing::error!("Crawl failed: {}", e);
            self.transition(CrawlPhase::Error);
            self.emit(CrawlEvent::Failed(e.to_string()));
        }

        let Self { session, .. } = self;
        session.close();

        outcome
    }

    async fn crawl(&mut self, start_url: &str) -> Result<Vec<PageRecord>, ScraperError> {
        let started = Instant::now();
        check_start_url(start_url)?;
        let mut state = RunState::default();

        // the seed must be in the same form as the links merged after it,
        // or a page linking to itself is crawled twice
        let seed = if self.config.normalize_links {
            normalize_link(start_url)
        } else {
            start_url.to_string()
        };

        tracing::info!("Starting crawl from {}", seed);
        self.transition(CrawlPhase::Discovering);
        let frontier = self.discover(&seed, &mut state).await?;
        let discovered = frontier.into_discovered();
        state.discovered = discovered.len();

        let mut pages = Vec::new();
        if !state.cancelled {
            self.transition(CrawlPhase::Fetching);
            pages = self.fetch_all(&discovered, &mut state).await;
        }

        if state.cancelled {
            pages.extend(self.session.drain_cache());
            tracing::info!("Crawl cancelled, keeping {} extracted pages", pages.len());
        } else {
            self.transition(CrawlPhase::Extracting);
        }
        for page in &pages {
            self.emit(CrawlEvent::Page(page.clone()));
        }

        self.transition(CrawlPhase::Done);
        let summary = CrawlSummary {
            start_url: start_url.to_string(),
            discovered: state.discovered,
            scraped: pages.len(),
            failed: state.failed.len(),
            cancelled: state.cancelled,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "Crawl completed: {} of {} pages scraped in {:?}",
            summary.scraped,
            summary.discovered,
            summary.elapsed
        );
        self.emit(CrawlEvent::Finished(summary));

        Ok(pages)
    }

    /// Expands the frontier round by round until it is exhausted
    ///
    /// `start_url` is the seed as it enters the frontier, already normalized
    /// when link normalization is on. It also serves as the default site root.
    async fn discover(
        &mut self,
        start_url: &str,
        state: &mut RunState,
    ) -> Result<Frontier, ScraperError> {
        let site_root = self.config.site_root_for(start_url).to_string();
        let mut frontier = Frontier::new(start_url, self.config.discovery_batch_size);
        let mut first_round = true;

        while !frontier.is_exhausted() {
            if self.session.is_cancelled() {
                state.cancelled = true;
                break;
            }

            let batch = frontier.next_batch();
            let fetcher = self.session.fetcher();
            let results = join_all(
                batch
                    .iter()
                    .map(|url| async move { (url, fetcher.fetch(url).await) }),
            )
            .await;

            let mut found = Vec::new();
            for (url, result) in results {
                match result {
                    Ok(html) => {
                        let links = self.links_from(&html, url, &site_root);
                        tracing::debug!("Found {} links in {}", links.len(), url);
                        found.extend(links);
                        if self.config.reuse_discovery_fetches {
                            self.session.cache_page(extract_page(&html, url));
                        }
                    }
                    Err(err) if first_round && url == start_url => {
                        return Err(ScraperError::StartUnreachable {
                            url: url.clone(),
                            source: err,
                        });
                    }
                    Err(err) => self.record_failure(url, &err, state),
                }
            }
            first_round = false;

            frontier.merge(found);
            let progress = frontier.progress();
            tracing::info!(
                "Processed {} pages, {} known, {} waiting",
                frontier.visited_count(),
                progress.total,
                frontier.unvisited_count()
            );
            self.emit(CrawlEvent::Discovery(progress));

            if !frontier.is_exhausted() {
                tokio::time::sleep(self.config.batch_delay()).await;
            }
        }

        let done = frontier.final_progress();
        tracing::info!("Link discovery complete. Found {} pages", done.total);
        self.emit(CrawlEvent::Discovery(done));

        Ok(frontier)
    }

    /// Fetches and extracts every discovered page in batches
    ///
    /// Pages already extracted during discovery are taken from the cache
    /// instead of being fetched again.
    async fn fetch_all(&mut self, urls: &[String], state: &mut RunState) -> Vec<PageRecord> {
        let batch_size = self.config.effective_fetch_batch_size();
        let total = urls.len();
        let mut pages = Vec::with_capacity(total);
        let mut processed = 0;

        for chunk in urls.chunks(batch_size) {
            if self.session.is_cancelled() {
                state.cancelled = true;
                break;
            }

            let mut to_fetch = Vec::new();
            for url in chunk {
                match self.session.take_cached(url) {
                    Some(page) => pages.push(page),
                    None => to_fetch.push(url),
                }
            }

            let fetcher = self.session.fetcher();
            let results = join_all(
                to_fetch
                    .into_iter()
                    .map(|url| async move { (url, fetcher.fetch(url).await) }),
            )
            .await;

            for (url, result) in results {
                match result {
                    Ok(html) => {
                        state.failed.remove(url);
                        pages.push(extract_page(&html, url));
                    }
                    Err(err) => self.record_failure(url, &err, state),
                }
            }

            processed += chunk.len();
            tracing::debug!("Fetched {}/{} pages", processed, total);
            self.emit(CrawlEvent::Fetch(ProgressEvent::new(processed, total)));

            if processed < total {
                tokio::time::sleep(self.config.batch_delay()).await;
            }
        }

        pages
    }

    fn links_from(&self, html: &str, url: &str, site_root: &str) -> HashSet<String> {
        let Ok(base) = Url::parse(url) else {
            return HashSet::new();
        };

        let links = extract_links(html, &base, site_root);
        if self.config.normalize_links {
            links.iter().map(|link| normalize_link(link)).collect()
        } else {
            links
        }
    }

    fn record_failure(&self, url: &str, err: &FetchError, state: &mut RunState) {
        tracing::warn!("Skipping {}: {}", url, err);
        state.failed.insert(url.to_string());
    }

    fn transition(&mut self, next: CrawlPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid phase transition {} -> {}",
            self.phase,
            next
        );
        tracing::debug!("Crawl phase: {} -> {}", self.phase, next);
        self.phase = next;
        self.emit(CrawlEvent::PhaseChanged(next));
    }

    fn emit(&self, event: CrawlEvent) {
        if let Some(events) = &self.events {
            // a listener that went away does not stop the crawl
            let _ = events.send(event);
        }
    }
}

/// Rejects start URLs that are not absolute http(s) URLs
fn check_start_url(start_url: &str) -> Result<(), ScraperError> {
    let invalid = |reason: String| ScraperError::InvalidStartUrl {
        url: start_url.to_string(),
        reason,
    };

    let url = Url::parse(start_url).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(())
}

/// Handle to a crawl running on a background task
pub struct CrawlHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<Vec<PageRecord>, ScraperError>>,
}

impl CrawlHandle {
    /// Stops the crawl after the batch in flight; partial results are kept
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the crawl to finish
    pub async fn join(self) -> Result<Vec<PageRecord>, ScraperError> {
        self.task
            .await
            .map_err(|e| ScraperError::Task(e.to_string()))?
    }
}

/// Runs a crawl and returns every extracted page
///
/// # Example
///
/// ```no_run
/// use wiki_scraper::config::CrawlConfig;
/// use wiki_scraper::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pages = run_crawl("https://wiki.example.com/docs", CrawlConfig::default()).await?;
/// println!("Scraped {} pages", pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    start_url: &str,
    config: CrawlConfig,
) -> Result<Vec<PageRecord>, ScraperError> {
    Coordinator::new(config)?.run(start_url).await
}

/// Starts a crawl on a background task
///
/// Returns a handle for cancelling and joining the crawl, and the receiving
/// end of its event channel.
pub fn spawn_crawl(
    start_url: impl Into<String>,
    config: CrawlConfig,
) -> Result<(CrawlHandle, EventReceiver), ScraperError> {
    let (tx, rx) = crate::crawler::events::event_channel();
    let coordinator = Coordinator::new(config)?.with_events(tx);
    let cancel = coordinator.cancellation_token();
    let start_url = start_url.into();

    let task = tokio::spawn(async move { coordinator.run(&start_url).await });

    Ok((CrawlHandle { cancel, task }, rx))
}
