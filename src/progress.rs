//! Progress reporting utilities using indicatif.
//!
//! The core reports progress through the [`ProgressSink`] trait and never
//! renders anything itself. [`Progress`] is the terminal implementation
//! used by the binary: one indicatif bar per active [`Phase`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Pipeline stage a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Directory enumeration; `total` is unknown and reported as 0.
    Enumerate,
    /// Candidates fingerprinted, counted in files.
    Fingerprint,
    /// Bytes hashed within a single large file.
    HashFile,
    /// Byte-by-byte verification of fingerprint matches.
    Verify,
    /// Duplicates resolved.
    Resolve,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Enumerate => "Enumerating",
            Self::Fingerprint => "Fingerprinting",
            Self::HashFile => "Hashing",
            Self::Verify => "Verifying",
            Self::Resolve => "Resolving",
        };
        f.write_str(name)
    }
}

/// Receiver for progress events.
///
/// Implementations must be cheap; events arrive from worker threads while
/// fingerprints are being computed.
pub trait ProgressSink: Send + Sync {
    /// `processed` of `total` units are done for `phase`.
    fn on_progress(&self, processed: u64, total: u64, phase: Phase);

    /// Free-form status text, e.g. the file currently being hashed.
    fn on_message(&self, _message: &str) {}

    /// No further events will arrive for `phase` until it restarts.
    fn on_phase_end(&self, _phase: Phase) {}
}

/// Terminal progress reporter.
pub struct Progress {
    multi: MultiProgress,
    bars: Mutex<HashMap<Phase, ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupe_eraser::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = MultiProgress::new();
        if quiet {
            multi.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
            quiet,
        }
    }

    fn style_for(phase: Phase) -> ProgressStyle {
        match phase {
            Phase::Enumerate => {
                ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            }
            Phase::HashFile => ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.green/blue}] {bytes}/{total_bytes} {msg} {bytes_per_sec}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-"),
            Phase::Fingerprint | Phase::Verify | Phase::Resolve => ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-"),
        }
    }

    fn new_bar(&self, phase: Phase, total: u64) -> ProgressBar {
        let bar = if phase == Phase::Enumerate {
            let pb = ProgressBar::new_spinner();
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::new(total)
        };
        let bar = self.multi.add(bar);
        bar.set_style(Self::style_for(phase));
        bar.set_message(phase.to_string());
        bar
    }
}

impl ProgressSink for Progress {
    fn on_progress(&self, processed: u64, total: u64, phase: Phase) {
        if self.quiet {
            return;
        }
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let bar = bars
            .entry(phase)
            .or_insert_with(|| self.new_bar(phase, total));
        if phase != Phase::Enumerate && bar.length() != Some(total) {
            bar.set_length(total);
        }
        bar.set_position(processed);
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Ok(bars) = self.bars.lock() {
            for bar in bars.values() {
                bar.set_message(truncate_path(message, 30));
            }
        }
    }

    fn on_phase_end(&self, phase: Phase) {
        if self.quiet {
            return;
        }
        if let Some(bar) = self.bars.lock().ok().and_then(|mut b| b.remove(&phase)) {
            if phase == Phase::HashFile {
                bar.finish_and_clear();
            } else {
                bar.finish_with_message(format!("{phase} complete"));
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
