//! Scanner module for concurrent traversal and content fingerprinting.
//!
//! This module provides functionality for:
//! - Sampling file content into 128-bit MD5 fingerprints
//! - A shared directory frontier drained by a fixed-size worker pool
//! - Concurrent fingerprint → paths aggregation
//! - Decentralized worker termination
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`fingerprint`]: Sampling strategies and the [`FingerprintPolicy`]
//! - [`frontier`]: The multi-producer/multi-consumer directory queue
//! - [`aggregator`]: Fingerprint → paths mapping shared by all workers
//! - [`worker`]: The per-thread drain loop and termination protocol
//! - [`orchestrator`]: Seeds the frontier, runs the pool and joins it
//!
//! # Example
//!
//! ```no_run
//! use sampledupe::config::ScanConfig;
//! use sampledupe::scanner::Scanner;
//! use std::path::PathBuf;
//!
//! let config = ScanConfig {
//!     roots: vec![PathBuf::from("/a"), PathBuf::from("/b")],
//!     ..Default::default()
//! };
//!
//! let (aggregation, summary) = Scanner::new(config).unwrap().run().unwrap();
//! for (fingerprint, paths) in aggregation.duplicates() {
//!     println!("{}: {:?}", fingerprint, paths);
//! }
//! println!("{} files fingerprinted", summary.files_fingerprinted);
//! ```

pub mod aggregator;
pub mod fingerprint;
pub mod frontier;
pub mod orchestrator;
pub mod summary;
pub mod worker;

use std::fmt;
use std::path::PathBuf;

// Re-export main types
pub use aggregator::Aggregation;
pub use fingerprint::{FingerprintPolicy, FingerprintStrategy};
pub use frontier::Frontier;
pub use orchestrator::Scanner;
pub use summary::ScanSummary;

/// Length of a fingerprint in bytes (MD5 digest).
pub const FINGERPRINT_LEN: usize = 16;

/// Digest of zero bytes, shared by every strategy.
pub const EMPTY_FINGERPRINT_HEX: &str = "d41d8cd98f00b204e9800998ecf8427e";

/// A 128-bit digest over a sampled region of a file.
///
/// Equal fingerprints mean the sampled bytes are probably identical.
/// Different fingerprints mean the files are certainly different.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Wrap raw digest bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// Lower-case hexadecimal representation (32 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 32-character hexadecimal string.
    ///
    /// Returns `None` if the string has the wrong length or contains
    /// non-hex characters.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != FINGERPRINT_LEN * 2 || !hex.is_ascii() {
            return None;
        }

        let mut bytes = [0u8; FINGERPRINT_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Errors that stop a scan as a whole.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The configuration was rejected before any worker started.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// The worker thread pool could not be created.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(String),

    /// The shutdown flag was raised before the scan finished.
    #[error("Scan interrupted")]
    Interrupted,
}

/// Errors that can occur while fingerprinting a single file.
///
/// None of these abort a scan; the worker logs the failure and skips the entry.
#[derive(thiserror::Error, Debug)]
pub enum FingerprintError {
    /// Permission was denied when opening or reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file vanished between listing and opening.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Any other I/O error while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl FingerprintError {
    /// Classify an I/O error raised while reading `path`.
    pub(crate) fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }

    /// Whether this is an Access-Denied or Vanished-Entry failure.
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::NotFound(_))
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(path) | Self::NotFound(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}
