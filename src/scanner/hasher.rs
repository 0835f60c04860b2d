//! Streaming fingerprint computation.
//!
//! # Overview
//!
//! [`FingerprintComputer`] turns a [`FileCandidate`] into a [`Fingerprint`]
//! under any [`Algorithm`]. Byte digests are computed by streaming the file
//! in [`HASH_CHUNK_SIZE`] chunks, so memory stays constant regardless of
//! file size. Perceptual algorithms decode the image instead and yield
//! [`Fingerprint::NotApplicable`] for anything that is not an image.
//!
//! Every successful computation is recorded in the attached
//! [`RunStatistics`]; files above the progress threshold also emit
//! byte-level [`Phase::HashFile`] events.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::algorithm::StreamHasher;
use super::perceptual::{is_image, PerceptualHasher};
use super::{Algorithm, FileCandidate, Fingerprint, HashError};
use crate::progress::{Phase, ProgressSink};
use crate::stats::RunStatistics;

/// Read size for streaming digests (8 KiB).
pub const HASH_CHUNK_SIZE: usize = 8 * 1024;

/// Files larger than this emit per-file progress by default (10 MiB).
pub const DEFAULT_PROGRESS_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Emit a byte-progress event every this many chunks (1 MiB).
const PROGRESS_EVERY_CHUNKS: u64 = 128;

/// Anything that can fingerprint a candidate.
///
/// The classifier only talks to this trait, which keeps it independent of
/// where fingerprints come from.
pub trait Fingerprinter: Send + Sync {
    fn fingerprint(
        &self,
        candidate: &FileCandidate,
        algorithm: Algorithm,
    ) -> Result<Fingerprint, HashError>;
}

/// Computes fingerprints from file contents.
#[derive(Clone, Default)]
pub struct FingerprintComputer {
    stats: Option<Arc<RunStatistics>>,
    progress: Option<Arc<dyn ProgressSink>>,
    progress_threshold: Option<u64>,
}

impl std::fmt::Debug for FingerprintComputer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintComputer")
            .field("stats", &self.stats.is_some())
            .field("progress", &self.progress.is_some())
            .field("progress_threshold", &self.progress_threshold())
            .finish()
    }
}

impl FingerprintComputer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record samples and counters in `stats`.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<RunStatistics>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Send byte-level progress for large files to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Size in bytes above which a file reports its own progress.
    #[must_use]
    pub fn with_progress_threshold(mut self, bytes: u64) -> Self {
        self.progress_threshold = Some(bytes);
        self
    }

    #[must_use]
    pub fn progress_threshold(&self) -> u64 {
        self.progress_threshold
            .unwrap_or(DEFAULT_PROGRESS_THRESHOLD)
    }

    /// Fingerprint `candidate` under `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read, or if it has an
    /// image extension but cannot be decoded under a perceptual algorithm.
    pub fn compute(
        &self,
        candidate: &FileCandidate,
        algorithm: Algorithm,
    ) -> Result<Fingerprint, HashError> {
        let start = Instant::now();
        let path = candidate.path.as_path();

        let fingerprint = match algorithm {
            Algorithm::Perceptual(perceptual) => {
                if !is_image(path) {
                    log::trace!("{} is not an image", path.display());
                    return Ok(Fingerprint::NotApplicable);
                }
                Fingerprint::Perceptual {
                    algorithm: perceptual,
                    bits: PerceptualHasher::new(perceptual).hash_bits(path)?,
                }
            }
            Algorithm::Strong(strong) => Fingerprint::Strong {
                algorithm: strong,
                digest: self.digest_file(path, candidate.size, strong.new_hasher())?,
            },
            Algorithm::Fast(fast) => Fingerprint::Fast {
                algorithm: fast,
                digest: self.digest_file(path, candidate.size, fast.new_hasher())?,
            },
        };

        let elapsed = start.elapsed();
        log::trace!(
            "{} {} in {:?}: {}",
            algorithm,
            path.display(),
            elapsed,
            fingerprint
        );
        if let Some(stats) = &self.stats {
            stats.record_sample(algorithm, candidate.size, elapsed);
        }
        Ok(fingerprint)
    }

    fn digest_file(
        &self,
        path: &Path,
        expected_size: u64,
        mut hasher: Box<dyn StreamHasher>,
    ) -> Result<Vec<u8>, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let progress = self
            .progress
            .as_ref()
            .filter(|_| expected_size > self.progress_threshold());
        if progress.is_some() {
            log::debug!(
                "Hashing large file {} ({} bytes)",
                path.display(),
                expected_size
            );
        }

        let mut buffer = [0u8; HASH_CHUNK_SIZE];
        let mut processed: u64 = 0;
        let mut chunks: u64 = 0;
        loop {
            let n = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..n]);
            processed += n as u64;
            chunks += 1;

            if let Some(sink) = progress {
                if chunks % PROGRESS_EVERY_CHUNKS == 0 {
                    sink.on_progress(processed, expected_size, Phase::HashFile);
                }
            }
        }

        if let Some(sink) = progress {
            sink.on_progress(processed, expected_size.max(processed), Phase::HashFile);
            sink.on_phase_end(Phase::HashFile);
        }
        Ok(hasher.finalize())
    }
}

impl Fingerprinter for FingerprintComputer {
    fn fingerprint(
        &self,
        candidate: &FileCandidate,
        algorithm: Algorithm,
    ) -> Result<Fingerprint, HashError> {
        self.compute(candidate, algorithm)
    }
}
