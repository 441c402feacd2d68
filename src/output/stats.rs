//! Crawl summary statistics
//!
//! This module provides the end-of-run summary reported to listeners and
//! printed by the command-line tool.

use std::time::Duration;

/// Summary of a finished crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlSummary {
    /// The seed URL
    pub start_url: String,

    /// Same-site URLs discovered
    pub discovered: usize,

    /// Pages that produced a record
    pub scraped: usize,

    /// URLs whose final fetch attempt failed
    pub failed: usize,

    /// Whether the run was stopped early
    pub cancelled: bool,

    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Returns the success rate as a percentage of discovered pages
    pub fn success_rate(&self) -> f64 {
        if self.discovered == 0 {
            return 0.0;
        }
        (self.scraped as f64 / self.discovered as f64) * 100.0
    }

    /// Pages per second over the whole run
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.scraped as f64 / secs
    }
}

/// Prints a summary to the console
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===");
    println!("  Start URL: {}", summary.start_url);
    println!("  Discovered: {}", summary.discovered);
    println!(
        "  Scraped: {} ({:.1}%)",
        summary.scraped,
        summary.success_rate()
    );
    println!("  Failed: {}", summary.failed);
    println!(
        "  Elapsed: {:.2}s ({:.2} pages/sec)",
        summary.elapsed.as_secs_f64(),
        summary.rate()
    );
    if summary.cancelled {
        println!("  Stopped early; results are partial");
    }
}
