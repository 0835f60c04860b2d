//! End-of-run reports.
//!
//! A [`RunReport`] collects everything a run produced. It is rendered
//! either as JSON ([`json`]) for scripting or as a human-readable summary
//! ([`text`]).

pub mod json;
pub mod text;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::actions::{Policy, ResolutionOutcome};
use crate::duplicates::{ClassifySummary, DuplicateGroup};
use crate::error::ExitCode;
use crate::scanner::Algorithm;
use crate::stats::StatsSnapshot;

pub use json::JsonOutput;
pub use text::TextOutput;

/// Report rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub algorithm: Algorithm,
    pub policy: Policy,
    pub generated_at: DateTime<Utc>,
    pub groups: Vec<DuplicateGroup>,
    pub outcomes: Vec<ResolutionOutcome>,
    pub summary: ClassifySummary,
    pub stats: StatsSnapshot,
    /// Directory entries the walker could not read.
    pub walk_errors: usize,
    pub exit_code: i32,
    pub exit_code_name: String,
}

impl RunReport {
    #[must_use]
    pub fn new(
        root: PathBuf,
        algorithm: Algorithm,
        policy: Policy,
        groups: Vec<DuplicateGroup>,
        outcomes: Vec<ResolutionOutcome>,
        summary: ClassifySummary,
        stats: StatsSnapshot,
    ) -> Self {
        let mut report = Self {
            root,
            algorithm,
            policy,
            generated_at: Utc::now(),
            groups,
            outcomes,
            summary,
            stats,
            walk_errors: 0,
            exit_code: 0,
            exit_code_name: String::new(),
        };
        report.refresh_exit_code();
        report
    }

    #[must_use]
    pub fn with_walk_errors(mut self, count: usize) -> Self {
        self.walk_errors = count;
        self.refresh_exit_code();
        self
    }

    fn refresh_exit_code(&mut self) {
        let code = self.exit_code();
        self.exit_code = code.as_i32();
        self.exit_code_name = code.code_prefix().to_string();
    }

    /// How the run ended.
    ///
    /// Interruption wins over everything; then any skipped file or failed
    /// resolution makes the run partial.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.summary.interrupted {
            ExitCode::Interrupted
        } else if self.walk_errors > 0
            || !self.summary.failures.is_empty()
            || self.outcomes.iter().any(|o| o.action.is_failure())
        {
            ExitCode::PartialSuccess
        } else if self.groups.is_empty() {
            ExitCode::NoDuplicates
        } else {
            ExitCode::Success
        }
    }
}
