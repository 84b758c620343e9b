// src/sink.rs
use csv::{Writer, WriterBuilder};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::ExtractedRow;

/// Output columns, in file order.
pub const COLUMNS: [&str; 6] = ["dataset_id", "section", "tab", "data_type", "value", "index"];

/// Append-only destination for extracted rows.
pub trait RowSink {
    fn append(&mut self, rows: &[ExtractedRow]) -> Result<()>;
}

/// Writes rows to a CSV file. The header goes out once in [`CsvSink::initialize`]; every
/// later batch reopens the file in append mode so earlier batches survive a crash.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncates the file and writes the header row.
    pub fn initialize(&self) -> Result<()> {
        let mut writer = Writer::from_path(&self.path)?;
        writer.write_record(COLUMNS)?;
        writer.flush()?;
        Ok(())
    }
}

impl RowSink for CsvSink {
    fn append(&mut self, rows: &[ExtractedRow]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl RowSink for Vec<ExtractedRow> {
    fn append(&mut self, rows: &[ExtractedRow]) -> Result<()> {
        self.extend_from_slice(rows);
        Ok(())
    }
}

/// Rows collected for the dataset currently being walked.
#[derive(Debug, Default)]
pub struct RowBuffer {
    rows: Vec<ExtractedRow>,
}

impl RowBuffer {
    pub fn extend(&mut self, rows: impl IntoIterator<Item = ExtractedRow>) {
        self.rows.extend(rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Hands the buffered rows to `sink` and empties the buffer. On failure the batch is
    /// gone; the caller decides how loudly to report it.
    pub fn flush_into<K: RowSink + ?Sized>(&mut self, sink: &mut K) -> Result<usize> {
        let rows = std::mem::take(&mut self.rows);
        if rows.is_empty() {
            return Ok(0);
        }
        sink.append(&rows)?;
        Ok(rows.len())
    }
}
