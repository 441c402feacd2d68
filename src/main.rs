//! Wiki-Scraper main entry point
//!
//! This is the command-line interface for the wiki crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wiki_scraper::config::{load_config, CrawlConfig, DEFAULT_START_URL};
use wiki_scraper::crawler::{spawn_crawl, CrawlEvent, CrawlPhase};
use wiki_scraper::output::{print_summary, save_output, OutputFormat, DEFAULT_OUTPUT_DIR};

/// Wiki-Scraper: crawl a documentation wiki into a single file
///
/// Discovers every page reachable from the start URL through same-site
/// links, extracts titles and visible text, and writes them to a dated file
/// under the output directory.
#[derive(Parser, Debug)]
#[command(name = "wiki-scraper")]
#[command(version)]
#[command(about = "Scrape a documentation wiki", long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "txt")]
    format: OutputFormat,

    /// Starting URL
    #[arg(long, default_value = DEFAULT_START_URL)]
    url: String,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory output files are written to
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Maximum simultaneous requests
    #[arg(long, value_name = "N")]
    max_concurrent: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Retries after a failed request
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Validate TLS certificates
    #[arg(long)]
    tls_verify: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    println!("Starting scrape from: {}", cli.url);
    let (handle, mut events) = spawn_crawl(cli.url.clone(), config)?;

    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nScraping interrupted by user, keeping pages scraped so far");
            cancel.cancel();
        }
    });

    let quiet = cli.quiet;
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            report_event(&event, quiet);
        }
    });

    let pages = handle.join().await.context("crawl failed")?;
    // the channel closes once the crawl task drops its sender
    let _ = printer.await;

    if pages.is_empty() {
        println!("No data was scraped. Please check the URL and try again.");
        return Ok(());
    }

    let today = chrono::Local::now().date_naive();
    let path = save_output(&pages, cli.format, &cli.output_dir, today)
        .with_context(|| format!("failed to write output to {}", cli.output_dir.display()))?;

    println!("Scraped {} pages", pages.len());
    println!("Data saved to: {}", path.display());

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wiki_scraper=info,warn"),
            1 => EnvFilter::new("wiki_scraper=debug,info"),
            2 => EnvFilter::new("wiki_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, if any, and applies flag overrides
fn build_config(cli: &Cli) -> anyhow::Result<CrawlConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => CrawlConfig::default(),
    };

    if let Some(max_concurrent) = cli.max_concurrent {
        config.max_concurrent = max_concurrent;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_seconds = timeout;
    }
    if let Some(retries) = cli.retries {
        config.max_retries = retries;
    }
    if cli.tls_verify {
        config.tls_verify = true;
    }

    wiki_scraper::config::validate(&config)?;
    Ok(config)
}

/// Prints one crawl event to the console
fn report_event(event: &CrawlEvent, quiet: bool) {
    match event {
        CrawlEvent::Failed(message) => eprintln!("An error occurred: {}", message),
        _ if quiet => {}
        CrawlEvent::PhaseChanged(CrawlPhase::Discovering) => println!("Discovering pages..."),
        CrawlEvent::PhaseChanged(CrawlPhase::Fetching) => println!("Fetching pages..."),
        CrawlEvent::PhaseChanged(phase) => tracing::debug!("Phase: {}", phase),
        CrawlEvent::Discovery(progress) => println!(
            "Discovering links: {} ({:.0}%)",
            progress,
            progress.fraction() * 100.0
        ),
        CrawlEvent::Fetch(progress) => println!(
            "Fetching pages: {} ({:.0}%)",
            progress,
            progress.fraction() * 100.0
        ),
        CrawlEvent::Page(page) => tracing::debug!("Scraped {} ({})", page.url, page.title),
        CrawlEvent::Finished(summary) => print_summary(summary),
    }
}
