//! Plain text output
//!
//! Each record is written as:
//!
//! ```text
//! URL: <url>
//! Title: <title>
//! Content:
//! <content>
//!
//! --------------------------------------------------------------------------------
//!
//! ```

use crate::crawler::PageRecord;
use crate::output::RecordSink;
use crate::OutputResult;
use std::io::Write;

const SEPARATOR_WIDTH: usize = 80;

/// Writes records in the human-readable text layout
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSink;

impl RecordSink for TextSink {
    fn write_records(&self, records: &[PageRecord], writer: &mut dyn Write) -> OutputResult<()> {
        let separator = "-".repeat(SEPARATOR_WIDTH);
        for page in records {
            writeln!(writer, "URL: {}", page.url)?;
            writeln!(writer, "Title: {}", page.title)?;
            writeln!(writer, "Content:\n{}\n", page.content)?;
            writeln!(writer, "{}\n", separator)?;
        }
        writer.flush()?;
        Ok(())
    }
}
