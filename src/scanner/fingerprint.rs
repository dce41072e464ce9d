//! Sampled MD5 fingerprinting of file contents.
//!
//! # Overview
//!
//! A [`FingerprintPolicy`] reads a bounded sample of a file in fixed-size
//! chunks and digests it with MD5. Three strategies are supported:
//!
//! - [`FingerprintStrategy::AlternateSampling`]: digest the first, third, fifth, ...
//!   chunk and skip the ones in between, until end-of-file.
//! - [`FingerprintStrategy::SizeCapped`]: digest the whole file, unless it is
//!   larger than `size_threshold`, in which case only the first chunk is used.
//! - [`FingerprintStrategy::FixedChunkCount`]: digest at most the first
//!   `chunk_count` chunks.
//!
//! Every strategy digests an empty file to the MD5 of zero bytes and never
//! reads past end-of-file. Chunks are always filled completely before being
//! digested (short reads are retried) so chunk boundaries depend only on the
//! file's bytes.
//!
//! # Example
//!
//! ```no_run
//! use sampledupe::scanner::{FingerprintPolicy, FingerprintStrategy};
//! use std::path::Path;
//!
//! let policy = FingerprintPolicy::new(FingerprintStrategy::FixedChunkCount)
//!     .with_chunk_count(4);
//! let fingerprint = policy.fingerprint(Path::new("/etc/hosts")).unwrap();
//! println!("{}", fingerprint);
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use super::{Fingerprint, FingerprintError, FINGERPRINT_LEN};

/// Default bytes per read (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Default size above which the size-capped strategy digests only the first chunk (50 MiB).
pub const DEFAULT_SIZE_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Default number of chunks digested by the fixed-chunk-count strategy.
pub const DEFAULT_CHUNK_COUNT: usize = 20;

/// Which region of a file contributes to its fingerprint.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum FingerprintStrategy {
    /// Digest every second chunk, starting with the first.
    #[default]
    AlternateSampling,
    /// Digest the full file, or only its first chunk when above the size threshold.
    #[value(alias = "size-capped-full-read")]
    #[serde(alias = "size-capped-full-read")]
    SizeCapped,
    /// Digest at most the first `chunk_count` chunks.
    FixedChunkCount,
}

impl std::fmt::Display for FingerprintStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlternateSampling => write!(f, "alternate-sampling"),
            Self::SizeCapped => write!(f, "size-capped"),
            Self::FixedChunkCount => write!(f, "fixed-chunk-count"),
        }
    }
}

/// A fingerprinting strategy together with its parameters.
///
/// Policies are plain values; each scan owns its own copy so scans with
/// different parameters never interfere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintPolicy {
    strategy: FingerprintStrategy,
    chunk_size: usize,
    size_threshold: u64,
    chunk_count: usize,
}

impl Default for FingerprintPolicy {
    fn default() -> Self {
        Self::new(FingerprintStrategy::default())
    }
}

impl FingerprintPolicy {
    /// Create a policy with default parameters for `strategy`.
    #[must_use]
    pub fn new(strategy: FingerprintStrategy) -> Self {
        Self {
            strategy,
            chunk_size: DEFAULT_CHUNK_SIZE,
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            chunk_count: DEFAULT_CHUNK_COUNT,
        }
    }

    /// Set the chunk size in bytes (clamped to at least 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the size-capped threshold in bytes.
    #[must_use]
    pub fn with_size_threshold(mut self, size_threshold: u64) -> Self {
        self.size_threshold = size_threshold;
        self
    }

    /// Set the maximum chunk count for the fixed-chunk-count strategy.
    #[must_use]
    pub fn with_chunk_count(mut self, chunk_count: usize) -> Self {
        self.chunk_count = chunk_count;
        self
    }

    /// Get the active strategy.
    #[must_use]
    pub fn strategy(&self) -> FingerprintStrategy {
        self.strategy
    }

    /// Get the chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Get the size-capped threshold in bytes.
    #[must_use]
    pub fn size_threshold(&self) -> u64 {
        self.size_threshold
    }

    /// Get the fixed-chunk-count limit.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Fingerprint the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError`] if the file cannot be opened or read.
    /// Permission and not-found failures are reported as their own variants
    /// so callers can skip them.
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let file =
            File::open(path).map_err(|e| FingerprintError::from_io(path.to_path_buf(), e))?;

        // Only the size-capped strategy looks at the size
        let size = match self.strategy {
            FingerprintStrategy::SizeCapped => file
                .metadata()
                .map_err(|e| FingerprintError::from_io(path.to_path_buf(), e))?
                .len(),
            _ => 0,
        };

        self.fingerprint_reader(file, size)
            .map_err(|e| FingerprintError::from_io(path.to_path_buf(), e))
    }

    /// Fingerprint any reader.
    ///
    /// `size` is the total length of the input; it is only consulted by the
    /// size-capped strategy.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if reading fails.
    pub fn fingerprint_reader<R: Read>(&self, mut reader: R, size: u64) -> io::Result<Fingerprint> {
        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut index: usize = 0;

        loop {
            let n = read_chunk(&mut reader, &mut buffer)?;
            if n == 0 {
                break;
            }

            let take = match self.strategy {
                FingerprintStrategy::AlternateSampling => index % 2 == 0,
                FingerprintStrategy::SizeCapped | FingerprintStrategy::FixedChunkCount => true,
            };
            if take {
                hasher.update(&buffer[..n]);
            }
            index += 1;

            let done = match self.strategy {
                FingerprintStrategy::AlternateSampling => false,
                FingerprintStrategy::SizeCapped => size > self.size_threshold,
                FingerprintStrategy::FixedChunkCount => index >= self.chunk_count,
            };
            if done || n < buffer.len() {
                break;
            }
        }

        let digest = hasher.finalize();
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest);
        Ok(Fingerprint::from_bytes(bytes))
    }
}

/// Fill `buffer` from `reader`, stopping early only at end-of-file.
fn read_chunk<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
