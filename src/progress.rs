//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`ScanProgress`] callback trait invoked by
//! workers, and [`Progress`], a spinner that implements it for terminal
//! output.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::scanner::ScanSummary;

/// Progress callback for a running scan.
///
/// Called concurrently from every worker, so implementations must be
/// `Send + Sync` and cheap.
pub trait ScanProgress: Send + Sync {
    /// A directory was listed.
    fn on_directory(&self, path: &Path);

    /// A file was fingerprinted.
    ///
    /// # Arguments
    ///
    /// * `path` - File that was fingerprinted
    /// * `bytes` - Size of the file in bytes
    fn on_file(&self, path: &Path, bytes: u64);

    /// A directory or file was skipped because it could not be read.
    fn on_skip(&self, _path: &Path) {}

    /// The scan finished and all workers have stopped.
    fn on_finish(&self, _summary: &ScanSummary) {}
}

/// Spinner showing directories, files and skips seen so far.
pub struct Progress {
    bar: ProgressBar,
    dirs: AtomicU64,
    files: AtomicU64,
    skipped: AtomicU64,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use sampledupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };

        Self {
            bar,
            dirs: AtomicU64::new(0),
            files: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    fn refresh(&self) {
        self.bar.set_message(format!(
            "{} dirs, {} files, {} skipped",
            self.dirs.load(Ordering::Relaxed),
            self.files.load(Ordering::Relaxed),
            self.skipped.load(Ordering::Relaxed),
        ));
    }
}

impl ScanProgress for Progress {
    fn on_directory(&self, _path: &Path) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    fn on_file(&self, _path: &Path, _bytes: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    fn on_skip(&self, _path: &Path) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    fn on_finish(&self, summary: &ScanSummary) {
        self.bar.finish_with_message(format!(
            "{} dirs, {} files ({}), {} skipped",
            summary.dirs_explored,
            summary.files_fingerprinted,
            summary.bytes_display(),
            summary.dirs_skipped + summary.files_skipped,
        ));
    }
}
