//! SampleDupe - Parallel Sampled-Fingerprint Duplicate Finder
//!
//! Walks one or more root directories with a fixed-size pool of workers
//! sharing a directory frontier, fingerprints every regular file from a
//! sample of its content (MD5 over selected chunks) and groups files by
//! fingerprint. The grouping is written once, after the scan, to a CSV file.
//!
//! Fingerprints are partial, so two files reported together are only
//! probably identical.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::sync::Arc;

use anyhow::Context;

use crate::cli::Cli;
use crate::config::ScanConfig;
use crate::error::ExitCode;
use crate::output::CsvResultWriter;
use crate::progress::Progress;
use crate::scanner::Scanner;

/// Run the application for parsed command-line arguments.
///
/// Loads the layered configuration, runs the scan to quiescence and writes
/// the result file exactly once.
///
/// # Errors
///
/// Returns an error if the configuration is invalid (before any worker
/// starts), the scan is interrupted, or the result file cannot be written.
/// Skipped directories and files are not errors; they yield
/// [`ExitCode::PartialSuccess`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    log::debug!("Log level: {}", logging::current_level_name());

    let config = ScanConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;
    log::debug!("Configuration: {:?}", config);

    let output = config.output.clone();
    let handler = signal::install_handler()?;
    let progress = Arc::new(Progress::new(cli.quiet || cli.no_progress));

    let scanner = Scanner::new(config)?
        .with_shutdown_flag(handler.get_flag())
        .with_progress(progress);
    let (aggregation, summary) = scanner.run()?;

    let path = CsvResultWriter::new(&aggregation)
        .write_file(&output)
        .with_context(|| format!("Failed to write results to {}", output.display()))?;
    if path != output {
        log::info!(
            "{} already exists, wrote {} instead",
            output.display(),
            path.display()
        );
    }

    let duplicates = aggregation.duplicates();
    log::info!(
        "{} fingerprints, {} with duplicates, written to {}",
        aggregation.len(),
        duplicates.len(),
        path.display()
    );
    if !cli.quiet {
        println!("{}", path.display());
    }

    let code = if summary.has_skips() {
        ExitCode::PartialSuccess
    } else if duplicates.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    };
    Ok(code)
}
