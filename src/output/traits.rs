//! Result sink trait and output formats

use crate::crawler::PageRecord;
use crate::output::{JsonSink, TextSink};
use crate::OutputResult;
use std::io::Write;

/// Serializes crawl output to a writer
pub trait RecordSink {
    /// Writes all records to `writer`
    ///
    /// # Arguments
    ///
    /// * `records` - The pages to write, in order
    /// * `writer` - Destination
    fn write_records(&self, records: &[PageRecord], writer: &mut dyn Write) -> OutputResult<()>;
}

/// Supported output file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Txt,
}

impl OutputFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Txt => "txt",
        }
    }

    /// Sink that writes this format
    pub fn sink(&self) -> Box<dyn RecordSink> {
        match self {
            Self::Json => Box::new(JsonSink),
            Self::Txt => Box::new(TextSink),
        }
    }
}
