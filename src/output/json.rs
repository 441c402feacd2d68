//! JSON output: an indented array of `{url, title, content}` objects

use crate::crawler::PageRecord;
use crate::output::RecordSink;
use crate::OutputResult;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Writes records as pretty-printed UTF-8 JSON with four-space indentation
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink;

impl RecordSink for JsonSink {
    fn write_records(&self, records: &[PageRecord], writer: &mut dyn Write) -> OutputResult<()> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, formatter);
        records.serialize(&mut serializer)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Reads a JSON output file back into page records
pub fn read_json_records(path: &Path) -> OutputResult<Vec<PageRecord>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
