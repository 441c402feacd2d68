//! Wiki-Scraper: a same-site documentation wiki crawler
//!
//! This crate discovers every page reachable from a seed URL through same-site
//! links, fetches each page under a bounded concurrency limit, extracts its
//! title and visible text, and hands the records to a result sink.

pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Only failures that stop the whole crawl end up here. A single page that
/// cannot be fetched is logged and skipped instead.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Invalid start URL '{url}': {reason}")]
    InvalidStartUrl { url: String, reason: String },

    #[error("Start URL {url} is unreachable: {source}")]
    StartUnreachable { url: String, source: FetchError },

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Crawl task failed: {0}")]
    Task(String),
}

/// Per-request fetch failures
///
/// These are values, not panics: the caller decides whether to skip or retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    BadStatus(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Returns true if another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) => true,
            Self::BadStatus(code) => *code >= 500,
        }
    }

    /// Classifies a reqwest error into the fetch taxonomy
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::BadStatus(status.as_u16())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result sink errors
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for output operations
pub type OutputResult<T> = std::result::Result<T, OutputError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{run_crawl, spawn_crawl, CrawlEvent, CrawlPhase, PageRecord, ProgressEvent};
pub use output::{save_output, OutputFormat};
