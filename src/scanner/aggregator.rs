//! Fingerprint → paths mapping shared by all workers.
//!
//! Backed by a [`DashMap`]: `record` holds the shard lock for its key
//! while appending, so two workers finishing files with the same
//! fingerprint never lose an update. Path order inside a record is the
//! order workers finished in and carries no meaning.

use std::path::{Path, PathBuf};

use dashmap::DashMap;

use super::Fingerprint;

/// Concurrent mapping from fingerprint to the files sharing it.
#[derive(Debug, Default)]
pub struct Aggregation {
    records: DashMap<Fingerprint, Vec<PathBuf>>,
}

impl Aggregation {
    /// Create an empty aggregation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the record for `fingerprint`.
    pub fn record(&self, fingerprint: Fingerprint, path: PathBuf) {
        self.records.entry(fingerprint).or_default().push(path);
    }

    /// Number of distinct fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of paths across all records.
    #[must_use]
    pub fn total_paths(&self) -> usize {
        self.records.iter().map(|r| r.value().len()).sum()
    }

    /// Paths recorded under `fingerprint`, if any.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Vec<PathBuf>> {
        self.records.get(fingerprint).map(|r| r.value().clone())
    }

    /// Fingerprint recorded for `path`, if any.
    #[must_use]
    pub fn fingerprint_of(&self, path: &Path) -> Option<Fingerprint> {
        self.records
            .iter()
            .find(|r| r.value().iter().any(|p| p == path))
            .map(|r| *r.key())
    }

    /// All records, sorted by fingerprint.
    #[must_use]
    pub fn records(&self) -> Vec<(Fingerprint, Vec<PathBuf>)> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    /// Records holding two or more paths, sorted by fingerprint.
    #[must_use]
    pub fn duplicates(&self) -> Vec<(Fingerprint, Vec<PathBuf>)> {
        self.records()
            .into_iter()
            .filter(|(_, paths)| paths.len() >= 2)
            .collect()
    }
}
