//! Output module for writing crawl results
//!
//! This module handles:
//! - Serializing page records as JSON or plain text
//! - Naming and placing dated output files
//! - Summarizing a finished crawl

mod json;
pub mod stats;
mod text;
mod traits;

pub use json::{read_json_records, JsonSink};
pub use stats::{print_summary, CrawlSummary};
pub use text::TextSink;
pub use traits::{OutputFormat, RecordSink};

use crate::crawler::PageRecord;
use crate::OutputResult;
use chrono::NaiveDate;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Prefix of every output file name
pub const OUTPUT_FILE_PREFIX: &str = "mafia_game_wiki";

/// Default directory output files are written to
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Builds the dated output path, e.g. `output/mafia_game_wiki_2024-05-01.json`
pub fn output_path(dir: &Path, format: OutputFormat, date: NaiveDate) -> PathBuf {
    dir.join(format!(
        "{}_{}.{}",
        OUTPUT_FILE_PREFIX,
        date.format("%Y-%m-%d"),
        format.extension()
    ))
}

/// Writes records to a dated file under `dir`, creating `dir` if needed
///
/// # Arguments
///
/// * `records` - The pages to write
/// * `format` - Output format
/// * `dir` - Output directory
/// * `date` - Date embedded in the file name
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - Failed to create the directory or write the file
pub fn save_output(
    records: &[PageRecord],
    format: OutputFormat,
    dir: &Path,
    date: NaiveDate,
) -> OutputResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = output_path(dir, format, date);

    let mut writer = BufWriter::new(File::create(&path)?);
    format.sink().write_records(records, &mut writer)?;

    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(path)
}
