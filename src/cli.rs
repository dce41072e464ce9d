//! Command-line interface definitions for SampleDupe.
//!
//! ```bash
//! # Scan two trees with the default alternate-sampling fingerprint
//! sampledupe -d /data/photos /backup/photos
//!
//! # First 20 chunks of 8 KiB per file, 16 workers, custom output file
//! sampledupe -d /srv --strategy fixed-chunk-count --chunk-count 20 --workers 16 -o srv.csv
//!
//! # Full read below 50 MiB, first chunk only above it
//! sampledupe -d ~/Downloads --strategy size-capped --size-threshold 50MiB
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::ConfigOverrides;
use crate::scanner::worker::TerminationMode;
use crate::scanner::FingerprintStrategy;

/// Find duplicate files across directories using sampled content fingerprints.
///
/// Every regular file under the given roots is fingerprinted from part of its
/// content and files sharing a fingerprint are written to a CSV file. Because
/// only samples are compared, reported duplicates may be false positives.
#[derive(Debug, Parser)]
#[command(name = "sampledupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root directories to scan (repeatable, several per flag)
    #[arg(short = 'd', long = "dir", value_name = "DIR", num_args = 1.., action = ArgAction::Append)]
    pub dirs: Vec<PathBuf>,

    /// Number of parallel workers (default: hardware concurrency)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Fingerprinting strategy
    #[arg(short, long, value_enum, value_name = "STRATEGY")]
    pub strategy: Option<FingerprintStrategy>,

    /// Bytes read per I/O call (e.g. 8KiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_chunk_size)]
    pub chunk_size: Option<usize>,

    /// size-capped: files above this size use only their first chunk (e.g. 50MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub size_threshold: Option<u64>,

    /// fixed-chunk-count: maximum chunks digested per file
    #[arg(long, value_name = "K")]
    pub chunk_count: Option<usize>,

    /// Wait before a worker re-checks an empty frontier, in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// How workers decide the scan is finished
    #[arg(long, value_enum, value_name = "MODE")]
    pub termination: Option<TerminationMode>,

    /// Follow symbolic links (no cycle detection)
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Result file; a number is appended if it already exists
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not show the progress spinner
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// Command-line values as the top configuration layer.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            roots: (!self.dirs.is_empty()).then(|| self.dirs.clone()),
            worker_count: self.workers,
            fingerprint_strategy: self.strategy,
            chunk_size: self.chunk_size,
            size_threshold: self.size_threshold,
            chunk_count: self.chunk_count,
            poll_interval_ms: self.poll_interval_ms,
            termination: self.termination,
            follow_symlinks: self.follow_symlinks.then_some(true),
            output: self.output.clone(),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Accepts plain byte counts and SI/IEC suffixes, e.g. `8192`, `8KiB`,
/// `1MB`, `50MiB`.
///
/// # Examples
///
/// ```
/// use sampledupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("8KiB").unwrap(), 8192);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error message if the string is not a valid size.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    s.parse::<bytesize::ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{s}': {e}"))
}

fn parse_chunk_size(s: &str) -> Result<usize, String> {
    let bytes = parse_size(s)?;
    usize::try_from(bytes).map_err(|_| format!("Chunk size too large: '{s}'"))
}
