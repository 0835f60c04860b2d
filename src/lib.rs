//! dupe-eraser: find duplicate files and get rid of them safely.
//!
//! The pipeline has three stages, each usable on its own:
//!
//! 1. [`scan`] enumerates regular files below a root
//! 2. [`classify`] partitions them by size, fingerprints each size group
//!    and builds [`DuplicateGroup`]s, optionally verifying matches byte by
//!    byte and matching similar images perceptually
//! 3. [`resolve`] reports, deletes or quarantines the duplicates
//!
//! ```no_run
//! use dupe_eraser::{classify, resolve, scan, ClassifierConfig, Policy};
//! use dupe_eraser::scanner::{Algorithm, StrongAlgorithm};
//! use dupe_eraser::stats::RunStatistics;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let root = Path::new("/data");
//! let candidates: Vec<_> = scan(root, true, None).unwrap().filter_map(Result::ok).collect();
//!
//! let stats = Arc::new(RunStatistics::new());
//! let config = ClassifierConfig::new(Algorithm::Strong(StrongAlgorithm::Sha256))
//!     .with_stats(Arc::clone(&stats));
//! let (groups, summary) = classify(candidates, &config);
//! println!("{} groups, {} reclaimable", summary.duplicate_groups, summary.reclaimable_display());
//!
//! let outcomes = resolve(&groups, Policy::Report, &root.join("dupe_eraser_safe"), &stats);
//! ```

pub mod actions;
pub mod benchmark;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod stats;

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

pub use actions::{resolve, Action, Policy, ResolutionExecutor, ResolutionOutcome};
pub use duplicates::{classify, ClassifierConfig, ClassifySummary, DuplicateGroup};
pub use scanner::{scan, FileCandidate, Fingerprint};

use cli::{BenchmarkArgs, Cli, Commands, ScanArgs};
use config::Settings;
use error::{AppError, ExitCode};
use output::{JsonOutput, OutputFormat, RunReport, TextOutput};
use progress::{Phase, Progress, ProgressSink};
use scanner::{Algorithm, HashFamily};
use stats::RunStatistics;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Configuration errors (exit code 4) and failures that prevent a report
/// from being produced. Per-file problems never end up here.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let colored = !cli.no_color && io::stdout().is_terminal();

    let code = match cli.command {
        Commands::Scan(ref args) => run_scan(args, cli.quiet, colored)?,
        Commands::Benchmark(ref args) => run_benchmark(args)?,
        Commands::Algorithms => {
            print!("{}", algorithm_listing());
            ExitCode::Success
        }
    };
    Ok(code)
}

fn run_scan(args: &ScanArgs, quiet: bool, colored: bool) -> Result<ExitCode, AppError> {
    let settings = Settings::load(args.config.as_deref(), &args.overrides()?)?;
    let config = settings.validate(&args.path)?;
    log::info!(
        "Scanning {} ({}{})",
        config.root.display(),
        config.algorithm,
        if config.recursive { ", recursive" } else { "" }
    );

    let handler = signal::install_handler()?;
    if let Some(secs) = args.timeout {
        handler.arm_timeout(Duration::from_secs(secs));
    }
    let stats = Arc::new(RunStatistics::new());
    let progress: Arc<dyn ProgressSink> = Arc::new(Progress::new(quiet || args.no_progress));

    let enumerator = scan(&config.root, config.recursive, Some(&config.quarantine_dir))?
        .with_shutdown_flag(handler.get_flag());
    let mut candidates = Vec::new();
    let mut walk_errors = 0usize;
    for entry in enumerator {
        match entry {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                log::warn!("{}", e);
                walk_errors += 1;
            }
        }
        progress.on_progress((candidates.len() + walk_errors) as u64, 0, Phase::Enumerate);
    }
    progress.on_phase_end(Phase::Enumerate);
    log::info!("Found {} files", candidates.len());

    let classifier_config = config
        .classifier_config(Arc::clone(&stats))
        .with_progress(Arc::clone(&progress))
        .with_shutdown_flag(handler.get_flag());
    let (groups, summary) = classify(candidates, &classifier_config);
    log::info!(
        "{} duplicate groups, {} duplicates, {} reclaimable",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display()
    );

    let outcomes = if summary.interrupted {
        log::warn!("Run interrupted; no duplicates were touched");
        Vec::new()
    } else {
        ResolutionExecutor::new(config.policy, &config.quarantine_dir, &stats)
            .with_progress(Arc::clone(&progress))
            .resolve(&groups)
    };

    let report = RunReport::new(
        config.root.clone(),
        config.algorithm,
        config.policy,
        groups,
        outcomes,
        summary,
        stats.snapshot(),
    )
    .with_walk_errors(walk_errors);

    let stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Json => JsonOutput::new(&report).write_to(stdout)?,
        OutputFormat::Text => TextOutput::new(&report).with_color(colored).write_to(stdout)?,
    }
    Ok(report.exit_code())
}

fn run_benchmark(args: &BenchmarkArgs) -> Result<ExitCode, AppError> {
    log::info!(
        "Benchmarking {} ({} iterations per algorithm)",
        args.file.display(),
        args.iterations
    );
    let results = benchmark::benchmark_file(&args.file, args.iterations)?;
    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, &results)?;
            io::Write::write_all(&mut stdout, b"\n")?;
        }
        OutputFormat::Text => io::Write::write_all(
            &mut stdout,
            benchmark::render_table(&results).as_bytes(),
        )?,
    }
    Ok(ExitCode::Success)
}

/// Supported algorithm names, one family per line.
#[must_use]
pub fn algorithm_listing() -> String {
    [HashFamily::Strong, HashFamily::Fast, HashFamily::Perceptual]
        .iter()
        .map(|family| {
            let names: Vec<&str> = Algorithm::all()
                .filter(|a| a.family() == *family)
                .map(Algorithm::name)
                .collect();
            let default = if *family == Algorithm::default().family() {
                format!(" (default: {})", Algorithm::default())
            } else {
                String::new()
            };
            format!("{family}{default}: {}\n", names.join(", "))
        })
        .collect()
}
