//! Duplicate classification pipeline.
//!
//! # Overview
//!
//! The classifier turns a stream of [`FileCandidate`]s into
//! [`DuplicateGroup`]s:
//! 1. **Size partition**: group by exact size, drop singletons
//!    (see [`crate::duplicates::groups`])
//! 2. **Fingerprint partition**: fingerprint every member of a size group
//!    on a bounded rayon pool before any decision is made for that group
//! 3. **Shallow check** (optional): confirm fingerprint matches byte by byte
//! 4. **Perceptual fallback** (optional): accept images whose perceptual
//!    hashes are within the distance threshold when the primary test fails
//!
//! Within a size group the earliest remaining member becomes an original
//! and every remaining member that passes the active test *against that
//! original* joins its group. Members that match nothing stay in the pool
//! and may become originals themselves. Matching is not transitive: two
//! duplicates of the same original are never compared with each other.
//!
//! # Example
//!
//! ```no_run
//! use dupe_eraser::duplicates::{classify, ClassifierConfig};
//! use dupe_eraser::scanner::{scan, Algorithm};
//! use std::path::Path;
//!
//! let candidates = scan(Path::new("."), true, None)
//!     .unwrap()
//!     .filter_map(Result::ok);
//! let config = ClassifierConfig::new(Algorithm::default()).with_shallow_check(true);
//! let (groups, summary) = classify(candidates, &config);
//! println!("{} groups, {} duplicates", groups.len(), summary.duplicate_files);
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use super::groups::{group_by_size, DuplicateEntry, DuplicateGroup, GroupingStats, MatchKind, SizeGroup};
use super::verify::files_identical;
use crate::cache::FingerprintCache;
use crate::progress::{Phase, ProgressSink};
use crate::scanner::hasher::DEFAULT_PROGRESS_THRESHOLD;
use crate::scanner::perceptual::{is_image, DEFAULT_THRESHOLD};
use crate::scanner::{
    Algorithm, FileCandidate, Fingerprint, FingerprintComputer, Fingerprinter, HashError,
    PerceptualAlgorithm,
};
use crate::stats::RunStatistics;

/// Default number of fingerprinting threads. Kept low to avoid disk thrashing.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Perceptual fallback settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerceptualFallback {
    pub algorithm: PerceptualAlgorithm,
    /// Largest Hamming distance still accepted as a match
    pub threshold: u32,
}

impl Default for PerceptualFallback {
    fn default() -> Self {
        Self {
            algorithm: PerceptualAlgorithm::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Configuration for a classification run.
#[derive(Clone)]
pub struct ClassifierConfig {
    /// Primary fingerprint algorithm.
    pub algorithm: Algorithm,
    /// Confirm fingerprint matches with a byte comparison.
    pub shallow_check: bool,
    /// Perceptual fallback for images, when enabled.
    pub perceptual: Option<PerceptualFallback>,
    /// Number of I/O threads for parallel fingerprinting.
    pub io_threads: usize,
    /// Files above this many bytes report their own hashing progress.
    pub progress_threshold: u64,
    /// Statistics the default fingerprinter records into.
    pub stats: Option<Arc<RunStatistics>>,
    /// Replaces the default [`FingerprintComputer`].
    pub fingerprinter: Option<Arc<dyn Fingerprinter>>,
    /// Optional progress sink.
    pub progress: Option<Arc<dyn ProgressSink>>,
    /// Stop scheduling size groups once set.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Stop scheduling size groups after this instant.
    pub deadline: Option<Instant>,
}

impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("algorithm", &self.algorithm)
            .field("shallow_check", &self.shallow_check)
            .field("perceptual", &self.perceptual)
            .field("io_threads", &self.io_threads)
            .field("progress_threshold", &self.progress_threshold)
            .field("stats", &self.stats.as_ref().map(|_| "<stats>"))
            .field(
                "fingerprinter",
                &self.fingerprinter.as_ref().map(|_| "<fingerprinter>"),
            )
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .field("shutdown_flag", &self.shutdown_flag)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::new(Algorithm::default())
    }
}

impl ClassifierConfig {
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            shallow_check: false,
            perceptual: None,
            io_threads: DEFAULT_IO_THREADS,
            progress_threshold: DEFAULT_PROGRESS_THRESHOLD,
            stats: None,
            fingerprinter: None,
            progress: None,
            shutdown_flag: None,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_shallow_check(mut self, enabled: bool) -> Self {
        self.shallow_check = enabled;
        self
    }

    /// Enable the perceptual fallback.
    #[must_use]
    pub fn with_perceptual(mut self, algorithm: PerceptualAlgorithm, threshold: u32) -> Self {
        self.perceptual = Some(PerceptualFallback {
            algorithm,
            threshold,
        });
        self
    }

    /// Set the number of fingerprinting threads (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn with_progress_threshold(mut self, bytes: u64) -> Self {
        self.progress_threshold = bytes;
        self
    }

    #[must_use]
    pub fn with_stats(mut self, stats: Arc<RunStatistics>) -> Self {
        self.stats = Some(stats);
        self
    }

    #[must_use]
    pub fn with_fingerprinter(mut self, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        self.fingerprinter = Some(fingerprinter);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Whether further size groups should be refused.
    fn should_stop(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// A file that could not be fingerprinted and was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintFailure {
    pub path: PathBuf,
    pub error: String,
}

/// What a classification run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassifySummary {
    /// Size partition statistics
    pub grouping: GroupingStats,
    /// Files fingerprinted (cache hits included)
    pub fingerprinted: usize,
    /// Files skipped because fingerprinting failed
    pub failures: Vec<FingerprintFailure>,
    /// Fingerprint matches confirmed or rejected by the shallow check
    pub verified_pairs: usize,
    /// Fingerprint matches the shallow check rejected
    pub collisions_rejected: usize,
    /// Duplicates admitted by the perceptual fallback
    pub perceptual_matches: usize,
    /// Number of duplicate groups found
    pub duplicate_groups: usize,
    /// Number of duplicates (originals not counted)
    pub duplicate_files: usize,
    /// Bytes held by duplicates
    pub reclaimable_space: u64,
    /// Fingerprint cache hits
    pub cache_hits: u64,
    /// Fingerprint cache misses
    pub cache_misses: u64,
    /// Size groups never examined because the run was stopped
    pub skipped_groups: usize,
    /// Whether the run was stopped early
    pub interrupted: bool,
    /// Wall-clock duration in seconds
    pub duration_secs: f64,
}

impl ClassifySummary {
    /// Human-readable reclaimable space.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_space).to_string()
    }
}

/// One member of a size group with its fingerprints.
struct Member {
    file: FileCandidate,
    fingerprint: Fingerprint,
    perceptual: Option<Fingerprint>,
}

/// Stateful classifier. Its fingerprint cache survives across
/// [`Classifier::classify`] calls.
pub struct Classifier {
    config: ClassifierConfig,
    fingerprinter: Arc<dyn Fingerprinter>,
    cache: FingerprintCache,
    pool: Option<rayon::ThreadPool>,
}

impl Classifier {
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        let fingerprinter = config.fingerprinter.clone().unwrap_or_else(|| {
            let mut computer =
                FingerprintComputer::new().with_progress_threshold(config.progress_threshold);
            if let Some(stats) = &config.stats {
                computer = computer.with_stats(Arc::clone(stats));
            }
            if let Some(progress) = &config.progress {
                computer = computer.with_progress(Arc::clone(progress));
            }
            Arc::new(computer)
        });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.io_threads.max(1))
            .build()
            .map_err(|e| {
                log::warn!(
                    "Failed to create fingerprint thread pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
            })
            .ok();

        Self {
            config,
            fingerprinter,
            cache: FingerprintCache::new(),
            pool,
        }
    }

    /// The classifier's fingerprint cache.
    #[must_use]
    pub fn cache(&self) -> &FingerprintCache {
        &self.cache
    }

    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify `candidates` into duplicate groups.
    pub fn classify(
        &self,
        candidates: impl IntoIterator<Item = FileCandidate>,
    ) -> (Vec<DuplicateGroup>, ClassifySummary) {
        let start = Instant::now();
        let hits_before = self.cache.hits();
        let misses_before = self.cache.misses();

        let (size_groups, grouping) = group_by_size(candidates);
        let total = grouping.potential_duplicates as u64;
        let mut summary = ClassifySummary {
            grouping,
            ..Default::default()
        };
        let processed = AtomicU64::new(0);
        let mut groups = Vec::new();

        log::info!(
            "Fingerprinting {} files in {} size groups with {}",
            total,
            size_groups.len(),
            self.config.algorithm
        );

        let group_count = size_groups.len();
        for (index, size_group) in size_groups.into_iter().enumerate() {
            if self.config.should_stop() {
                summary.interrupted = true;
                summary.skipped_groups = group_count - index;
                log::info!(
                    "Classification stopped, {} size groups not examined",
                    summary.skipped_groups
                );
                break;
            }
            let members = self.fingerprint_group(size_group, &processed, total, &mut summary);
            groups.extend(self.partition(members, &mut summary));
        }

        if let Some(progress) = &self.config.progress {
            progress.on_phase_end(Phase::Fingerprint);
        }

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.cache_hits = self.cache.hits() - hits_before;
        summary.cache_misses = self.cache.misses() - misses_before;
        summary.duration_secs = start.elapsed().as_secs_f64();

        log::info!(
            "Classification complete: {} groups, {} duplicates, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        (groups, summary)
    }

    /// Compute every fingerprint for one size group. Members that fail are
    /// dropped and recorded in `summary`.
    fn fingerprint_group(
        &self,
        group: SizeGroup,
        processed: &AtomicU64,
        total: u64,
        summary: &mut ClassifySummary,
    ) -> Vec<Member> {
        log::debug!(
            "Fingerprinting size group of {} bytes ({} files)",
            group.size,
            group.len()
        );

        let work = || {
            group
                .files
                .into_par_iter()
                .map(|file| {
                    let primary = self.fingerprint(&file, self.config.algorithm);
                    let perceptual = match (&primary, self.config.perceptual) {
                        (Ok(_), Some(fallback)) if is_image(&file.path) => self
                            .fingerprint(&file, Algorithm::Perceptual(fallback.algorithm))
                            .map_err(|e| {
                                log::debug!("No perceptual hash for {}: {}", file.path.display(), e);
                            })
                            .ok(),
                        _ => None,
                    };

                    let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(progress) = &self.config.progress {
                        progress.on_progress(done, total, Phase::Fingerprint);
                    }
                    (file, primary, perceptual)
                })
                .collect::<Vec<_>>()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        };

        let mut members = Vec::with_capacity(results.len());
        for (file, primary, perceptual) in results {
            match primary {
                Ok(fingerprint) => {
                    summary.fingerprinted += 1;
                    members.push(Member {
                        file,
                        fingerprint,
                        perceptual,
                    });
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", file.path.display(), e);
                    summary.failures.push(FingerprintFailure {
                        path: file.path,
                        error: e.to_string(),
                    });
                }
            }
        }
        members
    }

    fn fingerprint(
        &self,
        file: &FileCandidate,
        algorithm: Algorithm,
    ) -> Result<Fingerprint, HashError> {
        if let Some(cached) = self.cache.get(file, algorithm) {
            log::trace!("Cache hit for {}", file.path.display());
            return Ok(cached);
        }
        let fingerprint = self.fingerprinter.fingerprint(file, algorithm)?;
        if algorithm == self.config.algorithm {
            if let Some(stats) = &self.config.stats {
                stats.record_file(file.size);
            }
        }
        self.cache.insert(file, algorithm, fingerprint.clone());
        Ok(fingerprint)
    }

    /// Split one fingerprinted size group into duplicate groups, taking
    /// originals in enumeration order.
    fn partition(&self, members: Vec<Member>, summary: &mut ClassifySummary) -> Vec<DuplicateGroup> {
        let mut groups = Vec::new();
        let mut remaining = members;

        while !remaining.is_empty() {
            let original = remaining.remove(0);
            let mut duplicates = Vec::new();
            let mut unmatched = Vec::with_capacity(remaining.len());

            for other in remaining {
                match self.matches(&original, &other, summary) {
                    Some(kind) => {
                        log::debug!(
                            "{} duplicates {} ({:?})",
                            other.file.path.display(),
                            original.file.path.display(),
                            kind
                        );
                        duplicates.push(DuplicateEntry {
                            file: other.file,
                            matched_by: kind,
                        });
                    }
                    None => unmatched.push(other),
                }
            }

            remaining = unmatched;
            if let Some(group) = DuplicateGroup::new(original.file, duplicates) {
                groups.push(group);
            }
        }
        groups
    }

    /// Run the active equivalence test of `other` against `original`.
    fn matches(
        &self,
        original: &Member,
        other: &Member,
        summary: &mut ClassifySummary,
    ) -> Option<MatchKind> {
        if original.fingerprint == other.fingerprint {
            if !self.config.shallow_check {
                return Some(MatchKind::Fingerprint);
            }
            summary.verified_pairs += 1;
            match files_identical(&original.file.path, &other.file.path) {
                Ok(true) => return Some(MatchKind::Verified),
                Ok(false) => {
                    summary.collisions_rejected += 1;
                    log::warn!(
                        "Fingerprint collision: {} and {} differ",
                        original.file.path.display(),
                        other.file.path.display()
                    );
                }
                Err(e) => {
                    log::warn!(
                        "Could not compare {} with {}: {}",
                        original.file.path.display(),
                        other.file.path.display(),
                        e
                    );
                }
            }
        }

        let threshold = self.config.perceptual?.threshold;
        let distance = original
            .perceptual
            .as_ref()?
            .hamming_distance(other.perceptual.as_ref()?)?;
        if distance <= threshold {
            summary.perceptual_matches += 1;
            Some(MatchKind::Perceptual)
        } else {
            log::trace!(
                "Perceptual distance {} between {} and {} exceeds {}",
                distance,
                original.file.path.display(),
                other.file.path.display(),
                threshold
            );
            None
        }
    }
}

/// Classify `candidates` with a fresh [`Classifier`].
pub fn classify(
    candidates: impl IntoIterator<Item = FileCandidate>,
    config: &ClassifierConfig,
) -> (Vec<DuplicateGroup>, ClassifySummary) {
    Classifier::new(config.clone()).classify(candidates)
}
