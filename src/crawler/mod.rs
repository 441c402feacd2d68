//! Crawler module for page discovery and retrieval
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with admission control and optional retry
//! - HTML parsing for links, titles and visible text
//! - Frontier management for breadth-wise discovery
//! - Overall crawl coordination and progress events

mod coordinator;
mod events;
mod fetcher;
mod frontier;
mod parser;
mod session;

pub use coordinator::{run_crawl, spawn_crawl, Coordinator, CrawlHandle};
pub use events::{event_channel, CrawlEvent, CrawlPhase, EventReceiver, EventSender, ProgressEvent};
pub use fetcher::{build_http_client, FetchClient, HttpTransport, RetryPolicy, Transport};
pub use frontier::{Frontier, DEFAULT_BATCH_SIZE};
pub use parser::{extract_links, extract_page, PageRecord};
pub use session::CrawlSession;
