//! In-memory fingerprint cache.
//!
//! The classifier owns one [`FingerprintCache`] per run so a file is never
//! hashed twice under the same algorithm, even when it is looked at from
//! several comparisons. Nothing is persisted between runs.
//!
//! # Cache Invalidation
//!
//! Entries are keyed by canonical path and algorithm and validated against:
//! * File size
//! * Modification time (mtime)
//!
//! A lookup whose candidate disagrees on either attribute drops the stale
//! entry and reports a miss. A hit also re-stats the file, so a candidate
//! captured before the file changed on disk cannot return the old
//! fingerprint.

pub mod entry;

pub use entry::CacheEntry;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::scanner::{Algorithm, FileCandidate, Fingerprint};

type CacheKey = (PathBuf, Algorithm);

/// Thread-safe map from (canonical path, algorithm) to fingerprint.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FingerprintCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached fingerprint of `candidate` under `algorithm`, if still valid.
    pub fn get(&self, candidate: &FileCandidate, algorithm: Algorithm) -> Option<Fingerprint> {
        let key = (canonical(&candidate.path), algorithm);
        let Ok(mut entries) = self.entries.lock() else {
            return None;
        };

        let found = match entries.get(&key) {
            Some(entry) if entry.is_valid_for(candidate) && entry.matches_disk(&key.0) => {
                Some(entry.fingerprint.clone())
            }
            Some(_) => {
                log::debug!("Invalidating stale cache entry for {}", key.0.display());
                entries.remove(&key);
                None
            }
            None => None,
        };

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Remember `fingerprint` for `candidate` in its current state.
    pub fn insert(&self, candidate: &FileCandidate, algorithm: Algorithm, fingerprint: Fingerprint) {
        let key = (canonical(&candidate.path), algorithm);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, CacheEntry::new(candidate, fingerprint));
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
