//! Scan configuration and layered loading.
//!
//! Settings are merged with figment, later layers winning:
//!
//! 1. Built-in defaults ([`ScanConfig::default`])
//! 2. A TOML file: the `--config` path, or `config.toml` in the platform
//!    config directory if it exists
//! 3. Environment variables prefixed `SAMPLEDUPE_` (e.g. `SAMPLEDUPE_CHUNK_SIZE`)
//! 4. Command-line flags ([`ConfigOverrides`])
//!
//! # Example
//!
//! ```toml
//! roots = ["/data/photos", "/backup/photos"]
//! fingerprint_strategy = "fixed-chunk-count"
//! chunk_size = 8192
//! chunk_count = 20
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::fingerprint::{
    DEFAULT_CHUNK_COUNT, DEFAULT_CHUNK_SIZE, DEFAULT_SIZE_THRESHOLD,
};
use crate::scanner::worker::TerminationMode;
use crate::scanner::{FingerprintPolicy, FingerprintStrategy};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "SAMPLEDUPE_";

/// Default result file name.
pub const DEFAULT_OUTPUT: &str = "output.csv";

/// Default wait between the two emptiness checks of the termination protocol.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal and surface before any worker starts.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No root directory was supplied.
    #[error("No root directories given")]
    NoRoots,

    /// A root does not exist.
    #[error("Root not found: {0}")]
    RootNotFound(PathBuf),

    /// A root exists but is not a directory.
    #[error("Root is not a directory: {0}")]
    RootNotADirectory(PathBuf),

    /// `chunk_size` is zero.
    #[error("chunk_size must be greater than zero")]
    InvalidChunkSize,

    /// `chunk_count` is zero.
    #[error("chunk_count must be greater than zero")]
    InvalidChunkCount,

    /// `worker_count` is zero.
    #[error("worker_count must be greater than zero")]
    InvalidWorkerCount,

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A layer could not be parsed or merged.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Every option recognised by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directories used to seed the frontier.
    pub roots: Vec<PathBuf>,
    /// Number of parallel workers (`None` = hardware concurrency).
    pub worker_count: Option<usize>,
    /// Which fingerprinting strategy runs.
    pub fingerprint_strategy: FingerprintStrategy,
    /// Bytes read per I/O call.
    pub chunk_size: usize,
    /// Size-capped strategy: files above this size are digested from their first chunk only.
    pub size_threshold: u64,
    /// Fixed-chunk-count strategy: maximum chunks digested per file.
    pub chunk_count: usize,
    /// Termination protocol wait interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Termination protocol.
    pub termination: TerminationMode,
    /// Descend into symlinked directories and fingerprint symlinked files.
    /// No cycle detection is performed.
    pub follow_symlinks: bool,
    /// Result file path (a numeric suffix is added if it exists).
    pub output: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            worker_count: None,
            fingerprint_strategy: FingerprintStrategy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            chunk_count: DEFAULT_CHUNK_COUNT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            termination: TerminationMode::default(),
            follow_symlinks: false,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

/// Command-line values that override every other layer when present.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint_strategy: Option<FingerprintStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_threshold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<TerminationMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_symlinks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl ScanConfig {
    /// Load the layered configuration.
    ///
    /// # Arguments
    ///
    /// * `file` - Explicit config file; must exist if given. When `None`, the
    ///   platform default file is used if present.
    /// * `overrides` - Command-line values
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing or a layer
    /// fails to parse. Roots are not checked here; see [`ScanConfig::validate`].
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let file = match file {
            Some(path) if !path.exists() => {
                return Err(ConfigError::FileNotFound(path.to_path_buf()))
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        Self::figment(file.as_deref(), overrides)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Build the figment for the given layers without extracting it.
    #[must_use]
    pub fn figment(file: Option<&Path>, overrides: &ConfigOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            log::debug!("Loading config from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    /// Platform-specific default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "sampledupe", "sampledupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check the configuration before any worker starts.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: missing roots, roots that
    /// are not directories, or zero-valued sizes/counts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }
        for root in &self.roots {
            if !root.exists() {
                return Err(ConfigError::RootNotFound(root.clone()));
            }
            if !root.is_dir() {
                return Err(ConfigError::RootNotADirectory(root.clone()));
            }
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        if self.chunk_count == 0 {
            return Err(ConfigError::InvalidChunkCount);
        }
        if self.worker_count == Some(0) {
            return Err(ConfigError::InvalidWorkerCount);
        }
        Ok(())
    }

    /// Worker count to use: the configured value or the host's parallelism.
    #[must_use]
    pub fn effective_worker_count(&self) -> usize {
        self.worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    /// Fingerprint policy described by this configuration.
    #[must_use]
    pub fn policy(&self) -> FingerprintPolicy {
        FingerprintPolicy::new(self.fingerprint_strategy)
            .with_chunk_size(self.chunk_size)
            .with_size_threshold(self.size_threshold)
            .with_chunk_count(self.chunk_count)
    }

    /// Termination wait interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert!(config.roots.is_empty());
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.size_threshold, 50 * 1024 * 1024);
        assert_eq!(config.chunk_count, 20);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.termination, TerminationMode::Polling);
        assert_eq!(
            config.fingerprint_strategy,
            FingerprintStrategy::AlternateSampling
        );
        assert!(config.effective_worker_count() >= 1);
    }

    #[test]
    fn test_validate_root_errors() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();

        let config = ScanConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::NoRoots)));

        let config = ScanConfig {
            roots: vec![dir.path().join("missing")],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::RootNotFound(_))));

        let config = ScanConfig {
            roots: vec![file],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RootNotADirectory(_))
        ));

        let config = ScanConfig {
            roots: vec![dir.path().to_path_buf()],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_values() {
        let dir = TempDir::new().unwrap();
        let base = ScanConfig {
            roots: vec![dir.path().to_path_buf()],
            ..Default::default()
        };

        let config = ScanConfig {
            chunk_size: 0,
            ..base.clone()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidChunkSize)));

        let config = ScanConfig {
            chunk_count: 0,
            ..base.clone()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidChunkCount)));

        let config = ScanConfig {
            worker_count: Some(0),
            ..base
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorkerCount)
        ));
    }

    #[test]
    fn test_file_layer_then_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "fingerprint_strategy = \"size-capped\"\nchunk_size = 4096\nchunk_count = 3\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            chunk_count: Some(7),
            ..Default::default()
        };
        let config = ScanConfig::figment(Some(&path), &overrides)
            .extract::<ScanConfig>()
            .unwrap();

        assert_eq!(config.fingerprint_strategy, FingerprintStrategy::SizeCapped);
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.chunk_count, 7);
        assert_eq!(config.size_threshold, DEFAULT_SIZE_THRESHOLD);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = ScanConfig::load(
            Some(&dir.path().join("nope.toml")),
            &ConfigOverrides::default(),
        );
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_file_is_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "chunk_size = \"lots\"\n").unwrap();

        let result = ScanConfig::load(Some(&path), &ConfigOverrides::default());
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_policy_from_config() {
        let config = ScanConfig {
            fingerprint_strategy: FingerprintStrategy::FixedChunkCount,
            chunk_size: 1024,
            chunk_count: 5,
            ..Default::default()
        };
        let policy = config.policy();
        assert_eq!(policy.strategy(), FingerprintStrategy::FixedChunkCount);
        assert_eq!(policy.chunk_size(), 1024);
        assert_eq!(policy.chunk_count(), 5);
    }
}
