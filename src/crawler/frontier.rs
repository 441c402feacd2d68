//! Frontier management for the discovery phase
//!
//! The frontier holds two disjoint sets: URLs discovered but not yet
//! visited, and URLs already handed out for link discovery. A URL moves from
//! the first set to the second exactly once and never comes back. Their
//! union is the discovery set.

use crate::crawler::events::ProgressEvent;
use std::collections::HashSet;

/// Default number of URLs expanded per discovery round
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Breadth-wise frontier over an a-priori unknown URL set
#[derive(Debug, Clone)]
pub struct Frontier {
    /// Discovered URLs not yet visited
    unvisited: HashSet<String>,

    /// URLs already handed out for link discovery
    visited: HashSet<String>,

    /// Maximum URLs per round
    batch_size: usize,
}

impl Frontier {
    /// Creates a frontier seeded with the start URL
    ///
    /// # Arguments
    ///
    /// * `start_url` - Absolute URL the crawl begins at
    /// * `batch_size` - Maximum URLs handed out per round (at least 1)
    pub fn new(start_url: impl Into<String>, batch_size: usize) -> Self {
        let start_url = start_url.into();
        Self {
            unvisited: HashSet::from([start_url]),
            visited: HashSet::new(),
            batch_size: batch_size.max(1),
        }
    }

    /// Takes up to `batch_size` unvisited URLs and marks them visited
    ///
    /// Order among the returned URLs carries no meaning. Returns an empty
    /// batch once the frontier is exhausted.
    pub fn next_batch(&mut self) -> Vec<String> {
        let batch: Vec<String> = self
            .unvisited
            .iter()
            .take(self.batch_size)
            .cloned()
            .collect();

        for url in &batch {
            self.unvisited.remove(url);
            self.visited.insert(url.clone());
        }

        batch
    }

    /// Merges links found during a round back into the frontier
    ///
    /// Links already visited are ignored, which also drops a page's links to
    /// itself. Returns the number of URLs that were new to the frontier.
    pub fn merge<I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for link in links {
            if self.visited.contains(&link) {
                continue;
            }
            if self.unvisited.insert(link) {
                added += 1;
            }
        }
        added
    }

    /// Returns true when no unvisited URLs remain
    pub fn is_exhausted(&self) -> bool {
        self.unvisited.is_empty()
    }

    /// Snapshot after a round; the total is advisory and may still grow
    pub fn progress(&self) -> ProgressEvent {
        ProgressEvent::new(
            self.visited.len(),
            self.visited.len() + self.unvisited.len(),
        )
    }

    /// Closing snapshot: both counts equal the number of visited URLs
    pub fn final_progress(&self) -> ProgressEvent {
        ProgressEvent::new(self.visited.len(), self.visited.len())
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn unvisited_count(&self) -> usize {
        self.unvisited.len()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Freezes discovery and returns every URL seen, sorted
    ///
    /// Unvisited URLs are included, which only matters when discovery was
    /// stopped early.
    pub fn into_discovered(self) -> Vec<String> {
        let mut urls: Vec<String> = self.visited.into_iter().chain(self.unvisited).collect();
        urls.sort();
        urls
    }
}
