//! CSV output for scan results.
//!
//! One row per distinct fingerprint.
//!
//! # Columns
//!
//! - `checksum`: MD5 fingerprint (hexadecimal)
//! - `paths`: every file sharing it, as a bracketed list of quoted paths
//!   (`['/a/x.txt', '/b/y.txt']`)
//!
//! Rows are sorted by checksum.

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{create_unique, WriterError};
use crate::scanner::Aggregation;

/// A single row in the CSV output.
#[derive(Debug, Serialize)]
struct CsvRow {
    checksum: String,
    paths: String,
}

/// CSV formatter for a finished [`Aggregation`].
pub struct CsvResultWriter<'a> {
    aggregation: &'a Aggregation,
}

impl<'a> CsvResultWriter<'a> {
    /// Create a new CSV writer.
    #[must_use]
    pub fn new(aggregation: &'a Aggregation) -> Self {
        Self { aggregation }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `WriterError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), WriterError> {
        // Header is written explicitly so an empty result still has one
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(["checksum", "paths"])?;
        for (fingerprint, paths) in self.aggregation.records() {
            csv_writer.serialize(CsvRow {
                checksum: fingerprint.to_hex(),
                paths: render_paths(&paths),
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the CSV output to a new file at `path`, or at the next free
    /// numbered name if `path` is taken. Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns `WriterError` if the file cannot be created or written.
    pub fn write_file(&self, path: &Path) -> Result<PathBuf, WriterError> {
        let (file, written) = create_unique(path)?;
        self.write_to(BufWriter::new(file))?;
        Ok(written)
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `WriterError` if serialization fails.
    pub fn to_string(&self) -> Result<String, WriterError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

/// Render paths as `['a', 'b']`.
fn render_paths(paths: &[PathBuf]) -> String {
    let items: Vec<String> = paths
        .iter()
        .map(|p| format!("'{}'", p.to_string_lossy().replace('\'', "\\'")))
        .collect();
    format!("[{}]", items.join(", "))
}
