//! Scan counters shared by workers and the final summary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Counters updated by every worker during a scan.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Directories listed successfully
    pub dirs_explored: AtomicU64,
    /// Files fingerprinted and recorded
    pub files_fingerprinted: AtomicU64,
    /// Bytes of the files fingerprinted (file sizes, not sampled bytes)
    pub bytes_seen: AtomicU64,
    /// Directories that could not be listed
    pub dirs_skipped: AtomicU64,
    /// Files that could not be fingerprinted
    pub files_skipped: AtomicU64,
}

impl ScanStats {
    pub(crate) fn record_dir(&self) {
        self.dirs_explored.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_file(&self, bytes: u64) {
        self.files_fingerprinted.fetch_add(1, Ordering::Relaxed);
        self.bytes_seen.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_dir_skip(&self) {
        self.dirs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_file_skip(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Freeze the counters into a summary.
    #[must_use]
    pub fn snapshot(&self, workers: usize, duration: Duration) -> ScanSummary {
        ScanSummary {
            dirs_explored: self.dirs_explored.load(Ordering::Relaxed),
            dirs_queued: 0,
            files_fingerprinted: self.files_fingerprinted.load(Ordering::Relaxed),
            bytes_seen: self.bytes_seen.load(Ordering::Relaxed),
            dirs_skipped: self.dirs_skipped.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            workers,
            duration,
        }
    }
}

/// Totals for a finished scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Directories listed successfully
    pub dirs_explored: u64,
    /// Directories pushed onto the frontier, roots included
    pub dirs_queued: u64,
    /// Files fingerprinted and recorded
    pub files_fingerprinted: u64,
    /// Total size of fingerprinted files in bytes
    pub bytes_seen: u64,
    /// Directories that could not be listed
    pub dirs_skipped: u64,
    /// Files that could not be fingerprinted
    pub files_skipped: u64,
    /// Number of workers that ran
    pub workers: usize,
    /// Wall-clock scan time
    pub duration: Duration,
}

impl ScanSummary {
    /// Whether any directory or file was skipped.
    #[must_use]
    pub fn has_skips(&self) -> bool {
        self.dirs_skipped > 0 || self.files_skipped > 0
    }

    /// Human-readable size of fingerprinted files.
    #[must_use]
    pub fn bytes_display(&self) -> String {
        bytesize::ByteSize::b(self.bytes_seen).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = ScanStats::default();
        stats.record_dir();
        stats.record_file(100);
        stats.record_file(24);
        stats.record_file_skip();

        let summary = stats.snapshot(4, Duration::from_secs(1));
        assert_eq!(summary.dirs_explored, 1);
        assert_eq!(summary.files_fingerprinted, 2);
        assert_eq!(summary.bytes_seen, 124);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.workers, 4);
        assert!(summary.has_skips());
    }

    #[test]
    fn test_summary_default_has_no_skips() {
        assert!(!ScanSummary::default().has_skips());
    }
}
