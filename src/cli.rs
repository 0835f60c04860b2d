//! Command-line interface definitions.
//!
//! ```bash
//! # Report duplicates under ~/Downloads (nothing is touched)
//! dupe-eraser scan ~/Downloads -r
//!
//! # SHA-256, byte-verified, duplicates moved aside
//! dupe-eraser scan ~/Downloads -r -a sha256 --shallow --quarantine
//!
//! # Similar images too, JSON report
//! dupe-eraser scan ~/Pictures -r --perceptual --output json
//!
//! # Compare hashing speed on a large file
//! dupe-eraser benchmark big.iso --iterations 5
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{policy_from_flags, ConfigError, SettingsOverrides};
use crate::output::OutputFormat;
use crate::scanner::PerceptualAlgorithm;

const MIB: u64 = 1024 * 1024;

/// Find duplicate files and report, delete or quarantine them.
#[derive(Debug, Parser)]
#[command(name = "dupe-eraser")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files
    Scan(ScanArgs),
    /// Measure hashing throughput of every byte-digest algorithm on a file
    Benchmark(BenchmarkArgs),
    /// List supported algorithm names
    Algorithms,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Fingerprint algorithm (see `dupe-eraser algorithms`) [default: xxh3_128]
    #[arg(short, long, value_name = "NAME")]
    pub algorithm: Option<String>,

    /// Confirm fingerprint matches byte by byte
    #[arg(long)]
    pub shallow: bool,

    /// Also match images that look alike
    #[arg(long)]
    pub perceptual: bool,

    /// Perceptual hash used with --perceptual [default: phash]
    #[arg(long, value_name = "NAME")]
    pub perceptual_algorithm: Option<PerceptualAlgorithm>,

    /// Largest Hamming distance treated as the same image [default: 5]
    #[arg(long, value_name = "BITS")]
    pub perceptual_threshold: Option<u32>,

    /// Permanently delete duplicates
    #[arg(long)]
    pub delete: bool,

    /// Move duplicates into the quarantine directory
    #[arg(long)]
    pub quarantine: bool,

    /// Quarantine directory; relative paths are under PATH [default: dupe_eraser_safe]
    #[arg(long, value_name = "DIR")]
    pub quarantine_dir: Option<PathBuf>,

    /// Number of I/O threads for hashing [default: 4]
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Show per-file progress for files above this size (e.g. 10MiB)
    ///
    /// Rounded up to whole MiB.
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub progress_threshold: Option<u64>,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Stop examining new size groups after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Configuration file (TOML) instead of the platform default
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ScanArgs {
    /// Flags given on the command line, as the top configuration layer.
    ///
    /// # Errors
    ///
    /// [`ConfigError::IncompatiblePolicies`] for `--delete --quarantine`.
    pub fn overrides(&self) -> Result<SettingsOverrides, ConfigError> {
        Ok(SettingsOverrides {
            algorithm: self.algorithm.clone(),
            recursive: self.recursive.then_some(true),
            shallow_check: self.shallow.then_some(true),
            perceptual: self.perceptual.then_some(true),
            perceptual_algorithm: self.perceptual_algorithm,
            perceptual_threshold: self.perceptual_threshold,
            progress_threshold_mb: self.progress_threshold.map(|b| b.div_ceil(MIB)),
            io_threads: self.io_threads,
            quarantine_dir: self.quarantine_dir.clone(),
            policy: policy_from_flags(self.delete, self.quarantine)?,
        })
    }
}

/// Arguments for the benchmark subcommand.
#[derive(Debug, Args)]
pub struct BenchmarkArgs {
    /// File to hash
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Runs per algorithm
    #[arg(long, value_name = "N", default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub iterations: u32,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// ```
/// use dupe_eraser::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("10MiB").unwrap(), 10_485_760);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// or has an unknown suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => MIB,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
