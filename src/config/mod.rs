//! Configuration module for Wiki-Scraper
//!
//! This module handles loading, parsing, and validating the crawl settings.
//! Every key is optional; an empty file yields the defaults.
//!
//! # Example
//!
//! ```no_run
//! use wiki_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Fetching with at most {} concurrent requests", config.max_concurrent);
//! ```

mod parser;
mod types;
mod validation;

pub use parser::{load_config, parse_config};
pub use types::{CrawlConfig, DEFAULT_START_URL};
pub use validation::validate;
