//! Run-wide counters and per-algorithm throughput samples.
//!
//! [`RunStatistics`] is shared by reference between the fingerprinting
//! workers and the resolution pass. Counters are atomics; the sample table
//! sits behind a mutex since it is touched once per hashed file.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::scanner::Algorithm;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Elapsed-time and size samples for one algorithm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlgorithmSamples {
    times: Vec<Duration>,
    sizes: Vec<u64>,
}

impl AlgorithmSamples {
    pub fn push(&mut self, elapsed: Duration, size: u64) {
        self.times.push(elapsed);
        self.sizes.push(size);
    }

    /// Number of samples recorded.
    #[must_use]
    pub fn count(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.sizes.iter().sum()
    }

    #[must_use]
    pub fn total_time(&self) -> Duration {
        self.times.iter().sum()
    }

    /// Total MB hashed divided by total seconds spent; 0 without samples
    /// or when no measurable time elapsed.
    #[must_use]
    pub fn mb_per_sec(&self) -> f64 {
        let secs = self.total_time().as_secs_f64();
        if self.times.is_empty() || secs <= 0.0 {
            return 0.0;
        }
        self.total_bytes() as f64 / BYTES_PER_MB / secs
    }

    /// Mean time per sample in milliseconds; 0 without samples.
    #[must_use]
    pub fn avg_time_ms(&self) -> f64 {
        if self.times.is_empty() {
            return 0.0;
        }
        self.total_time().as_secs_f64() * 1000.0 / self.times.len() as f64
    }
}

/// Counters for a single run.
#[derive(Debug, Default)]
pub struct RunStatistics {
    files_processed: AtomicU64,
    bytes_processed: AtomicU64,
    bytes_saved: AtomicU64,
    duplicates_found: AtomicU64,
    failures: AtomicU64,
    samples: Mutex<BTreeMap<&'static str, AlgorithmSamples>>,
}

impl RunStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A file of `size` bytes was fingerprinted with `algorithm` in `elapsed`.
    pub fn record_hash(&self, algorithm: Algorithm, size: u64, elapsed: Duration) {
        self.record_file(size);
        self.record_sample(algorithm, size, elapsed);
    }

    /// Count a candidate of `size` bytes as processed.
    ///
    /// Called once per file, however many algorithms looked at it.
    pub fn record_file(&self, size: u64) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        self.bytes_processed.fetch_add(size, Ordering::Relaxed);
    }

    /// Add a throughput sample for `algorithm` without touching the file
    /// counters.
    pub fn record_sample(&self, algorithm: Algorithm, size: u64, elapsed: Duration) {
        if let Ok(mut samples) = self.samples.lock() {
            samples
                .entry(algorithm.name())
                .or_default()
                .push(elapsed, size);
        }
    }

    /// A duplicate was resolved; `reclaimed` bytes were freed (0 for
    /// report-only or kept files).
    pub fn record_duplicate(&self, reclaimed: u64) {
        self.duplicates_found.fetch_add(1, Ordering::Relaxed);
        self.bytes_saved.fetch_add(reclaimed, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn files_processed(&self) -> u64 {
        self.files_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn bytes_saved(&self) -> u64 {
        self.bytes_saved.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn duplicates_found(&self) -> u64 {
        self.duplicates_found.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Copy of the samples recorded for `algorithm`.
    #[must_use]
    pub fn samples_for(&self, algorithm: Algorithm) -> AlgorithmSamples {
        self.samples
            .lock()
            .ok()
            .and_then(|s| s.get(algorithm.name()).cloned())
            .unwrap_or_default()
    }

    /// Point-in-time, serializable copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let algorithms = self
            .samples
            .lock()
            .map(|samples| {
                samples
                    .iter()
                    .map(|(name, s)| AlgorithmThroughput {
                        algorithm: (*name).to_string(),
                        files: s.count(),
                        bytes: s.total_bytes(),
                        mb_per_sec: s.mb_per_sec(),
                        avg_time_ms: s.avg_time_ms(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        StatsSnapshot {
            files_processed: self.files_processed(),
            bytes_processed: self.bytes_processed(),
            bytes_saved: self.bytes_saved(),
            duplicates_found: self.duplicates_found(),
            failures: self.failures(),
            algorithms,
        }
    }
}

/// Serializable view of [`RunStatistics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub files_processed: u64,
    pub bytes_processed: u64,
    pub bytes_saved: u64,
    pub duplicates_found: u64,
    pub failures: u64,
    pub algorithms: Vec<AlgorithmThroughput>,
}

/// Throughput figures for one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmThroughput {
    pub algorithm: String,
    pub files: usize,
    pub bytes: u64,
    pub mb_per_sec: f64,
    pub avg_time_ms: f64,
}
