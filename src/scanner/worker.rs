//! Worker loop that drains the frontier.
//!
//! Each worker:
//! - Pops one directory from the shared [`Frontier`]
//! - Lists its immediate entries
//! - Pushes subdirectories back onto the frontier
//! - Fingerprints regular files and records them in the [`Aggregation`]
//!
//! # Termination
//!
//! With [`TerminationMode::Polling`] a worker that finds the frontier empty
//! sleeps for one poll interval, checks again, and exits if it is still
//! empty. Workers do not coordinate before exiting: if the others give up
//! while one worker is still listing a large directory, that worker drains
//! whatever it pushes on its own. Nothing is lost, only parallelism.
//!
//! [`TerminationMode::InFlight`] waits instead until no directory is queued
//! or being processed anywhere in the pool.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::summary::ScanStats;
use super::{Aggregation, FingerprintPolicy, Frontier};
use crate::progress::ScanProgress;

/// Upper bound on the in-flight mode's retry sleep.
const IN_FLIGHT_MAX_WAIT: Duration = Duration::from_millis(50);

/// How a worker decides that the scan is over.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationMode {
    /// Exit after observing the frontier empty twice, one poll interval apart.
    #[default]
    Polling,
    /// Exit only when no directory is queued or in progress.
    InFlight,
}

impl std::fmt::Display for TerminationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Polling => write!(f, "polling"),
            Self::InFlight => write!(f, "in-flight"),
        }
    }
}

/// Why a worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The termination protocol declared the worker done.
    Quiescent,
    /// The shutdown flag was observed.
    Interrupted,
}

/// Marks a popped directory complete when dropped.
struct CompletionGuard<'a>(&'a Frontier);

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}

/// One unit of parallel execution.
///
/// Workers only borrow the shared state; the orchestrator owns it for the
/// duration of the scan.
pub struct Worker<'a> {
    /// Worker ID (for logging)
    pub id: usize,
    /// Shared directory queue
    pub frontier: &'a Frontier,
    /// Shared fingerprint → paths mapping
    pub aggregation: &'a Aggregation,
    /// Shared counters
    pub stats: &'a ScanStats,
    /// Fingerprint strategy and parameters
    pub policy: FingerprintPolicy,
    /// Termination protocol
    pub termination: TerminationMode,
    /// Wait between the two emptiness checks
    pub poll_interval: Duration,
    /// Descend into symlinked directories and fingerprint symlinked files
    pub follow_symlinks: bool,
    /// Optional cooperative stop flag
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress reporter
    pub progress: Option<Arc<dyn ScanProgress>>,
}

impl Worker<'_> {
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Run until the termination protocol or the shutdown flag stops this worker.
    pub fn run(&self) -> WorkerExit {
        log::debug!("Worker {} starting ({})", self.id, self.termination);

        let exit = loop {
            let Some(path) = self.next_directory() else {
                let exit = if self.is_shutdown_requested() {
                    WorkerExit::Interrupted
                } else {
                    WorkerExit::Quiescent
                };
                break exit;
            };

            let _guard = CompletionGuard(self.frontier);
            if self.is_shutdown_requested() {
                log::debug!("Worker {}: shutdown requested, stopping", self.id);
                break WorkerExit::Interrupted;
            }

            self.explore(&path);
        };

        log::debug!("Worker {} stopped: {:?}", self.id, exit);
        exit
    }

    /// Pop the next directory, applying the termination protocol when the frontier is empty.
    fn next_directory(&self) -> Option<PathBuf> {
        loop {
            if let Some(path) = self.frontier.pop() {
                return Some(path);
            }
            if self.is_shutdown_requested() {
                return None;
            }

            match self.termination {
                TerminationMode::Polling => {
                    thread::sleep(self.poll_interval);
                    return self.frontier.pop();
                }
                TerminationMode::InFlight => {
                    if self.frontier.pending() == 0 {
                        return None;
                    }
                    thread::sleep(self.poll_interval.min(IN_FLIGHT_MAX_WAIT));
                }
            }
        }
    }

    /// List one directory: push subdirectories, fingerprint files.
    fn explore(&self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.report_dir_error(dir, &e);
                return;
            }
        };

        self.stats.record_dir();
        if let Some(progress) = &self.progress {
            progress.on_directory(dir);
        }
        log::trace!("Worker {} exploring {}", self.id, dir.display());

        self.process_entries(dir, entries);
    }

    /// Classify each listed entry: push directories, fingerprint files.
    fn process_entries<I>(&self, dir: &Path, entries: I)
    where
        I: IntoIterator<Item = io::Result<fs::DirEntry>>,
    {
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Failed to read entry in {}: {}", dir.display(), e);
                    self.stats.record_file_skip();
                    if let Some(progress) = &self.progress {
                        progress.on_skip(dir);
                    }
                    continue;
                }
            };

            let path = entry.path();
            let metadata = match self.entry_metadata(&entry) {
                Ok(Some(m)) => m,
                Ok(None) => {
                    self.report_symlink_skip(&path);
                    continue;
                }
                Err(e) => {
                    self.report_file_error(&path, &e);
                    continue;
                }
            };

            if metadata.is_dir() {
                self.frontier.push(path);
            } else if metadata.is_file() {
                self.fingerprint_file(path, metadata.len());
            } else {
                log::trace!("Skipping special file: {}", path.display());
            }
        }
    }

    /// Metadata used to classify an entry; `None` for symlinks that are not followed.
    fn entry_metadata(&self, entry: &fs::DirEntry) -> io::Result<Option<fs::Metadata>> {
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            if !self.follow_symlinks {
                return Ok(None);
            }
            return fs::metadata(entry.path()).map(Some);
        }
        entry.metadata().map(Some)
    }

    fn fingerprint_file(&self, path: PathBuf, size: u64) {
        match self.policy.fingerprint(&path) {
            Ok(fingerprint) => {
                log::trace!("{} {}", fingerprint, path.display());
                if let Some(progress) = &self.progress {
                    progress.on_file(&path, size);
                }
                self.stats.record_file(size);
                self.aggregation.record(fingerprint, path);
            }
            Err(e) => {
                if e.is_skippable() {
                    log::debug!("Skipping file: {}", e);
                } else {
                    log::warn!("Skipping file: {}", e);
                }
                self.stats.record_file_skip();
                if let Some(progress) = &self.progress {
                    progress.on_skip(e.path());
                }
            }
        }
    }

    fn report_dir_error(&self, dir: &Path, error: &io::Error) {
        match error.kind() {
            io::ErrorKind::PermissionDenied => {
                log::warn!("Can't access directory: {}", dir.display());
            }
            io::ErrorKind::NotFound => {
                log::debug!(
                    "Directory not found (may have been deleted): {}",
                    dir.display()
                );
            }
            _ => log::warn!("I/O error listing {}: {}", dir.display(), error),
        }
        self.stats.record_dir_skip();
        if let Some(progress) = &self.progress {
            progress.on_skip(dir);
        }
    }

    /// Unfollowed symlinks count as skipped directories or files, by target.
    fn report_symlink_skip(&self, path: &Path) {
        log::debug!("Skipping symlink: {}", path.display());
        if fs::metadata(path).is_ok_and(|m| m.is_dir()) {
            self.stats.record_dir_skip();
        } else {
            self.stats.record_file_skip();
        }
        if let Some(progress) = &self.progress {
            progress.on_skip(path);
        }
    }

    fn report_file_error(&self, path: &Path, error: &io::Error) {
        match error.kind() {
            io::ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
            }
            _ => log::warn!("Failed to stat {}: {}", path.display(), error),
        }
        self.stats.record_file_skip();
        if let Some(progress) = &self.progress {
            progress.on_skip(path);
        }
    }
}
