//! Result writing for finished scans.
//!
//! The writer runs once, after every worker has stopped. It never
//! overwrites an existing file: [`create_unique`] appends a number
//! before the extension until it can create a new one.
//!
//! # Example
//!
//! ```no_run
//! use sampledupe::output::CsvResultWriter;
//! use sampledupe::scanner::Aggregation;
//! use std::path::Path;
//!
//! let aggregation = Aggregation::new();
//! let written = CsvResultWriter::new(&aggregation)
//!     .write_file(Path::new("output.csv"))
//!     .unwrap();
//! println!("{}", written.display());
//! ```

pub mod csv;

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use self::csv::CsvResultWriter;

/// Errors that can occur while writing results.
#[derive(Debug, Error)]
pub enum WriterError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Create a new file at `path`, or at the first free name derived from it.
///
/// Tries `path` itself, then `stem0.ext`, `stem1.ext`, ... in the same
/// directory. Each candidate is opened with `create_new`, so a file that
/// appears between two attempts is never truncated.
///
/// # Errors
///
/// Returns the I/O error of the first attempt that fails for any reason
/// other than the name being taken.
pub fn create_unique(path: &Path) -> io::Result<(File, PathBuf)> {
    for candidate in output_candidates(path) {
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((file, candidate)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free output name for {}", path.display()),
    ))
}

/// `path`, then `stem0.ext`, `stem1.ext`, ...
fn output_candidates(path: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    let stem = path.file_stem().map(OsString::from).unwrap_or_default();
    let extension = path.extension();

    std::iter::once(path.to_path_buf()).chain((0u64..).map(move |i| {
        let mut name = stem.clone();
        name.push(i.to_string());
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        path.with_file_name(name)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_create_unique_unused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.csv");
        let (_, created) = create_unique(&path).unwrap();
        assert_eq!(created, path);
    }

    #[test]
    fn test_create_unique_increments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.csv");
        fs::write(&path, b"keep").unwrap();
        assert_eq!(create_unique(&path).unwrap().1, dir.path().join("output0.csv"));

        fs::write(dir.path().join("output1.csv"), b"").unwrap();
        assert_eq!(create_unique(&path).unwrap().1, dir.path().join("output2.csv"));
        assert_eq!(fs::read(&path).unwrap(), b"keep");
    }

    #[test]
    fn test_create_unique_without_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results");
        fs::write(&path, b"").unwrap();
        assert_eq!(create_unique(&path).unwrap().1, dir.path().join("results0"));
    }

    #[test]
    fn test_create_unique_concurrent_callers_get_distinct_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.csv");

        let created: Vec<PathBuf> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let path = &path;
                    s.spawn(move || {
                        let (mut file, created) = create_unique(path).unwrap();
                        write!(file, "{i}").unwrap();
                        created
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut unique = created.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 8);
        for p in &created {
            assert_eq!(fs::read_to_string(p).unwrap().len(), 1);
        }
    }
}
