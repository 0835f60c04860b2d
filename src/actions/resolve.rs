//! Resolution of duplicate groups.
//!
//! [`ResolutionExecutor`] walks each group's duplicates from last to first
//! and applies the configured [`Policy`]. Nothing here aborts a run: every
//! per-file problem becomes an [`Action::Failed`] outcome.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::delete::{delete_file, DeleteError, FileSnapshot};
use super::quarantine::quarantine_file;
use crate::duplicates::DuplicateGroup;
use crate::progress::{Phase, ProgressSink};
use crate::scanner::FileCandidate;
use crate::stats::RunStatistics;

/// Directory name used for quarantine when none is configured.
pub const DEFAULT_QUARANTINE_DIR: &str = "dupe_eraser_safe";

/// What to do with duplicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Log only, never touch the file system.
    #[default]
    Report,
    /// Remove duplicates permanently.
    Delete,
    /// Move duplicates into the quarantine directory.
    Quarantine,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Report => "report",
            Self::Delete => "delete",
            Self::Quarantine => "quarantine",
        })
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "report" => Ok(Self::Report),
            "delete" => Ok(Self::Delete),
            "quarantine" | "move" => Ok(Self::Quarantine),
            other => Err(format!(
                "unknown policy '{other}' (expected report, delete or quarantine)"
            )),
        }
    }
}

/// What happened to one duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "detail")]
pub enum Action {
    /// Left in place because its original is gone.
    Kept,
    Deleted,
    /// Moved; holds the new location.
    Quarantined(PathBuf),
    Reported,
    /// Left in place; holds the reason.
    Failed(String),
}

impl Action {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome for a single duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionOutcome {
    pub path: PathBuf,
    pub original: PathBuf,
    #[serde(flatten)]
    pub action: Action,
    pub bytes_reclaimed: u64,
}

/// Applies a [`Policy`] to duplicate groups.
pub struct ResolutionExecutor<'a> {
    policy: Policy,
    quarantine_dir: PathBuf,
    stats: &'a RunStatistics,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl fmt::Debug for ResolutionExecutor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionExecutor")
            .field("policy", &self.policy)
            .field("quarantine_dir", &self.quarantine_dir)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl<'a> ResolutionExecutor<'a> {
    #[must_use]
    pub fn new(policy: Policy, quarantine_dir: impl Into<PathBuf>, stats: &'a RunStatistics) -> Self {
        Self {
            policy,
            quarantine_dir: quarantine_dir.into(),
            stats,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Resolve every duplicate of every group.
    ///
    /// Outcomes follow processing order: groups in order, duplicates of
    /// each group from last to first.
    pub fn resolve(&self, groups: &[DuplicateGroup]) -> Vec<ResolutionOutcome> {
        let total: u64 = groups.iter().map(|g| g.duplicate_count() as u64).sum();
        log::info!(
            "Resolving {} duplicates in {} groups ({})",
            total,
            groups.len(),
            self.policy
        );

        let mut outcomes = Vec::with_capacity(total as usize);
        let mut done = 0u64;
        for group in groups {
            for entry in group.duplicates.iter().rev() {
                let outcome = self.resolve_one(&entry.file, &group.original);
                match &outcome.action {
                    Action::Failed(reason) => {
                        log::warn!("{}: {}", outcome.path.display(), reason);
                        self.stats.record_failure();
                    }
                    _ => self.stats.record_duplicate(outcome.bytes_reclaimed),
                }
                outcomes.push(outcome);

                done += 1;
                if let Some(ref progress) = self.progress {
                    progress.on_progress(done, total, Phase::Resolve);
                }
            }
        }

        if let Some(ref progress) = self.progress {
            progress.on_phase_end(Phase::Resolve);
        }
        outcomes
    }

    fn resolve_one(&self, duplicate: &FileCandidate, original: &FileCandidate) -> ResolutionOutcome {
        let outcome = |action, bytes_reclaimed| ResolutionOutcome {
            path: duplicate.path.clone(),
            original: original.path.clone(),
            action,
            bytes_reclaimed,
        };

        if self.policy == Policy::Report {
            log::info!(
                "Duplicate: {} (original: {})",
                duplicate.path.display(),
                original.path.display()
            );
            return outcome(Action::Reported, 0);
        }

        match FileSnapshot::from(duplicate).verify() {
            Ok(()) => {}
            Err(DeleteError::Modified(_)) => {
                return outcome(Action::Failed("modified since scan".to_string()), 0)
            }
            Err(e) => return outcome(Action::Failed(e.to_string()), 0),
        }

        if !original.path.exists() {
            log::warn!(
                "Original {} is gone; keeping {}",
                original.path.display(),
                duplicate.path.display()
            );
            return outcome(Action::Kept, 0);
        }

        match self.policy {
            Policy::Delete => match delete_file(&duplicate.path) {
                Ok(freed) => outcome(Action::Deleted, freed),
                Err(e) => outcome(Action::Failed(e.to_string()), 0),
            },
            Policy::Quarantine => {
                let freed = if is_symlink(&duplicate.path) {
                    0
                } else {
                    duplicate.size
                };
                match quarantine_file(&duplicate.path, &self.quarantine_dir) {
                    Ok(target) => outcome(Action::Quarantined(target), freed),
                    Err(e) => outcome(Action::Failed(e.to_string()), 0),
                }
            }
            Policy::Report => outcome(Action::Reported, 0),
        }
    }
}

/// A link's bytes belong to its target, which stays where it is.
fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Resolve `groups` under `policy`, recording into `stats`.
pub fn resolve(
    groups: &[DuplicateGroup],
    policy: Policy,
    quarantine_dir: &Path,
    stats: &RunStatistics,
) -> Vec<ResolutionOutcome> {
    ResolutionExecutor::new(policy, quarantine_dir, stats).resolve(groups)
}
