//! Hash throughput comparison on a sample file.
//!
//! Every strong and fast algorithm hashes the same file a few times through
//! the regular [`FingerprintComputer`]; the timings land in a private
//! [`RunStatistics`] and are read back per algorithm.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::scanner::{Algorithm, FileCandidate, FingerprintComputer, HashError, HashFamily};
use crate::stats::RunStatistics;

/// Timing of one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub algorithm: Algorithm,
    pub family: HashFamily,
    pub mb_per_sec: f64,
    pub avg_time_ms: f64,
}

/// Hash `path` `iterations` times with every byte-digest algorithm.
///
/// Results are ordered fastest first.
///
/// # Errors
///
/// Returns the first [`HashError`]; a file that cannot be read fails on
/// the first algorithm.
pub fn benchmark_file(path: &Path, iterations: u32) -> Result<Vec<BenchmarkResult>, HashError> {
    let candidate =
        FileCandidate::from_path(path).map_err(|e| HashError::from_io(path, e))?;
    let stats = Arc::new(RunStatistics::new());
    let computer = FingerprintComputer::new()
        .with_stats(Arc::clone(&stats))
        .with_progress_threshold(u64::MAX);

    let mut results = Vec::new();
    for algorithm in Algorithm::byte_digests() {
        log::debug!("Benchmarking {}", algorithm);
        for _ in 0..iterations.max(1) {
            computer.compute(&candidate, algorithm)?;
        }
        let samples = stats.samples_for(algorithm);
        results.push(BenchmarkResult {
            algorithm,
            family: algorithm.family(),
            mb_per_sec: samples.mb_per_sec(),
            avg_time_ms: samples.avg_time_ms(),
        });
    }

    results.sort_by(|a, b| b.mb_per_sec.total_cmp(&a.mb_per_sec));
    Ok(results)
}

/// Plain-text table of `results`.
#[must_use]
pub fn render_table(results: &[BenchmarkResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<12} {:<6} {:>14} {:>12}", "Algorithm", "Family", "Speed", "Avg Time");
    for r in results {
        let _ = writeln!(
            out,
            "{:<12} {:<6} {:>9.1} MB/s {:>9.2} ms",
            r.algorithm.name(),
            r.family.to_string(),
            r.mb_per_sec,
            r.avg_time_ms
        );
    }
    out
}
