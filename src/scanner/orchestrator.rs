//! Scan orchestration: seed, run the worker pool, join.
//!
//! # Overview
//!
//! [`Scanner::run`] validates the roots, seeds the [`Frontier`] with them,
//! starts one [`Worker`] per pool thread and blocks until every worker has
//! stopped on its own. Only then is the finished [`Aggregation`] handed
//! back; nothing is streamed out while workers are still running.
//!
//! # Example
//!
//! ```no_run
//! use sampledupe::config::ScanConfig;
//! use sampledupe::scanner::Scanner;
//! use std::path::PathBuf;
//!
//! let config = ScanConfig {
//!     roots: vec![PathBuf::from(".")],
//!     worker_count: Some(4),
//!     ..Default::default()
//! };
//! let (aggregation, summary) = Scanner::new(config)?.run()?;
//! println!("{} fingerprints from {} files", aggregation.len(), summary.files_fingerprinted);
//! # Ok::<(), sampledupe::scanner::ScanError>(())
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::summary::ScanStats;
use super::worker::{Worker, WorkerExit};
use super::{Aggregation, Frontier, ScanError, ScanSummary};
use crate::config::ScanConfig;
use crate::progress::ScanProgress;

/// Runs one scan over a set of root directories.
pub struct Scanner {
    config: ScanConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ScanProgress>>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<progress>"))
            .finish()
    }
}

impl Scanner {
    /// Create a scanner, rejecting invalid configuration up front.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if a root is missing or not a
    /// directory, or a size/count is zero.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self {
            config,
            shutdown_flag: None,
            progress: None,
        })
    }

    /// Set the shutdown flag checked by workers after every pop.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress reporter.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ScanProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Get the scan configuration.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run the scan to quiescence.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::ThreadPool`] if the pool cannot be built and
    /// [`ScanError::Interrupted`] if the shutdown flag stopped any worker.
    pub fn run(self) -> Result<(Aggregation, ScanSummary), ScanError> {
        let started = Instant::now();
        let worker_count = self.config.effective_worker_count();
        let policy = self.config.policy();

        let frontier = Frontier::new();
        let aggregation = Aggregation::new();
        let stats = ScanStats::default();
        let interrupted = AtomicUsize::new(0);

        for root in &self.config.roots {
            frontier.push(root.clone());
        }

        log::info!(
            "Scanning {} root(s) with {} workers ({}, chunk size {})",
            self.config.roots.len(),
            worker_count,
            policy.strategy(),
            policy.chunk_size()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("sampledupe-worker-{i}"))
            .build()
            .map_err(|e| ScanError::ThreadPool(e.to_string()))?;

        pool.scope(|scope| {
            for id in 0..worker_count {
                let worker = Worker {
                    id,
                    frontier: &frontier,
                    aggregation: &aggregation,
                    stats: &stats,
                    policy,
                    termination: self.config.termination,
                    poll_interval: self.config.poll_interval(),
                    follow_symlinks: self.config.follow_symlinks,
                    shutdown_flag: self.shutdown_flag.clone(),
                    progress: self.progress.clone(),
                };
                let interrupted = &interrupted;
                scope.spawn(move |_| {
                    if worker.run() == WorkerExit::Interrupted {
                        interrupted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        let mut summary = stats.snapshot(worker_count, started.elapsed());
        summary.dirs_queued = frontier.total_pushed();
        if let Some(progress) = &self.progress {
            progress.on_finish(&summary);
        }

        if interrupted.load(Ordering::SeqCst) > 0 {
            log::info!("Scan interrupted after {:?}", summary.duration);
            return Err(ScanError::Interrupted);
        }

        log::info!(
            "Scan complete: {}/{} dirs, {} files ({}), {} fingerprints, {} skipped in {:?}",
            summary.dirs_explored,
            summary.dirs_queued,
            summary.files_fingerprinted,
            summary.bytes_display(),
            aggregation.len(),
            summary.dirs_skipped + summary.files_skipped,
            summary.duration
        );

        Ok((aggregation, summary))
    }
}
