//! Cache entry definitions.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::scanner::{FileCandidate, Fingerprint};

/// A fingerprint together with the file state it was computed from.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// File size at computation time
    pub size: u64,
    /// Modification time at computation time
    pub modified: Option<SystemTime>,
    /// The cached fingerprint
    pub fingerprint: Fingerprint,
}

impl CacheEntry {
    #[must_use]
    pub fn new(candidate: &FileCandidate, fingerprint: Fingerprint) -> Self {
        Self {
            size: candidate.size,
            modified: candidate.modified,
            fingerprint,
        }
    }

    /// Whether this entry still describes `candidate`.
    ///
    /// Both size and mtime must match; a candidate without an mtime never
    /// validates an entry that has one, and vice versa.
    #[must_use]
    pub fn is_valid_for(&self, candidate: &FileCandidate) -> bool {
        self.size == candidate.size && self.modified == candidate.modified
    }

    /// Whether the file at `path` still has the recorded size and mtime.
    #[must_use]
    pub fn matches_disk(&self, path: &Path) -> bool {
        fs::metadata(path)
            .is_ok_and(|m| m.len() == self.size && m.modified().ok() == self.modified)
    }
}
