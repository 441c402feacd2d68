//! Crawl progress events
//!
//! The orchestrator reports through a single typed channel. Any listener
//! (a console printer, a GUI dispatch loop) drains the receiver on its own
//! schedule; the orchestrator never blocks on a slow consumer.

use crate::crawler::parser::PageRecord;
use crate::output::CrawlSummary;
use std::fmt;
use tokio::sync::mpsc;

/// Point-in-time snapshot of crawl advancement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub current: usize,

    /// Advisory total; may grow while discovery is running. Never zero.
    pub total: usize,
}

impl ProgressEvent {
    pub fn new(current: usize, total: usize) -> Self {
        Self {
            current,
            total: total.max(current).max(1),
        }
    }

    /// Completed fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        (self.current as f64 / self.total as f64).min(1.0)
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

/// Orchestrator state machine
///
/// `Idle → Discovering → Fetching → Extracting → Done`, with `Error`
/// reachable from any active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    Idle,
    Discovering,
    Fetching,
    Extracting,
    Done,
    Error,
}

impl CrawlPhase {
    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;
        match (self, next) {
            (Idle, Discovering) => true,
            (Discovering, Fetching) => true,
            (Fetching, Extracting) => true,
            (Extracting, Done) => true,
            // cancellation
            (Discovering | Fetching, Done) => true,
            (Idle | Discovering | Fetching | Extracting, Error) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Everything a listener can observe about a running crawl
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    PhaseChanged(CrawlPhase),

    /// One discovery round finished
    Discovery(ProgressEvent),

    /// One fetch batch finished
    Fetch(ProgressEvent),

    /// One returned page
    ///
    /// Sent for every record the crawl returns: during `Extracting` on a
    /// complete run, or just before `Done` when the crawl was cancelled.
    Page(PageRecord),

    Finished(CrawlSummary),

    Failed(String),
}

pub type EventSender = mpsc::UnboundedSender<CrawlEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<CrawlEvent>;

/// Creates a new event channel
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
