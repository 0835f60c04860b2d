//! Human-readable rendering of a [`RunReport`].

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use bytesize::ByteSize;
use yansi::{Condition, Paint, Painted, Style};

use super::RunReport;
use crate::actions::Action;
use crate::duplicates::MatchKind;

const HEADER: Style = Style::new().bold();
const ORIGINAL: Style = Style::new().green();
const DUPLICATE: Style = Style::new().yellow();
const FAILURE: Style = Style::new().red().bold();

/// Text renderer.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    report: &'a RunReport,
    colored: bool,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        Self {
            report,
            colored: false,
        }
    }

    #[must_use]
    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    fn paint<'s>(&self, text: &'s str, style: Style) -> Painted<&'s str> {
        let condition = if self.colored {
            Condition::ALWAYS
        } else {
            Condition::NEVER
        };
        text.paint(style).whenever(condition)
    }

    /// The complete report.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_groups(&mut out);
        self.render_summary(&mut out);
        out
    }

    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }

    fn render_groups(&self, out: &mut String) {
        let report = self.report;
        if report.groups.is_empty() {
            let _ = writeln!(out, "No duplicates found.");
            return;
        }

        let actions: HashMap<&Path, &Action> = report
            .outcomes
            .iter()
            .map(|o| (o.path.as_path(), &o.action))
            .collect();

        let _ = writeln!(
            out,
            "{}",
            self.paint(&format!("{} duplicate groups", report.groups.len()), HEADER)
        );
        for (i, group) in report.groups.iter().enumerate() {
            let _ = writeln!(
                out,
                "\n[{}] {} x {}",
                i + 1,
                ByteSize::b(group.size),
                group.duplicate_count() + 1
            );
            let original = group.original.path.display().to_string();
            let _ = writeln!(out, "  = {}", self.paint(&original, ORIGINAL));

            for entry in &group.duplicates {
                let path = entry.file.path.display().to_string();
                let matched = match entry.matched_by {
                    MatchKind::Fingerprint => "fingerprint",
                    MatchKind::Verified => "verified",
                    MatchKind::Perceptual => "perceptual",
                };
                let _ = write!(out, "  - {} ({})", self.paint(&path, DUPLICATE), matched);
                if let Some(action) = actions.get(entry.file.path.as_path()) {
                    let _ = write!(out, " {}", self.describe(action));
                }
                out.push('\n');
            }
        }
        out.push('\n');
    }

    fn describe(&self, action: &Action) -> String {
        match action {
            Action::Kept => "kept (original missing)".to_string(),
            Action::Deleted => "deleted".to_string(),
            Action::Quarantined(target) => format!("moved to {}", target.display()),
            Action::Reported => "reported".to_string(),
            Action::Failed(reason) => self.paint(&format!("FAILED: {reason}"), FAILURE).to_string(),
        }
    }

    fn render_summary(&self, out: &mut String) {
        let report = self.report;
        let stats = &report.stats;
        let summary = &report.summary;

        let _ = writeln!(out, "{}", self.paint("Summary", HEADER));
        let _ = writeln!(out, "  Algorithm:           {}", report.algorithm);
        let _ = writeln!(out, "  Policy:              {}", report.policy);
        for throughput in &stats.algorithms {
            let _ = writeln!(
                out,
                "  Speed ({}):{:>width$.1} MB/s, {:.2} ms/file",
                throughput.algorithm,
                throughput.mb_per_sec,
                throughput.avg_time_ms,
                width = 12usize.saturating_sub(throughput.algorithm.len()) + 1,
            );
        }
        let removed = report
            .outcomes
            .iter()
            .filter(|o| matches!(o.action, Action::Deleted | Action::Quarantined(_)))
            .count();
        let _ = writeln!(out, "  Duplicates found:    {}", summary.duplicate_files);
        let _ = writeln!(out, "  Duplicates removed:  {}", removed);
        let _ = writeln!(out, "  Space saved:         {}", ByteSize::b(stats.bytes_saved));
        let _ = writeln!(
            out,
            "  Reclaimable:         {}",
            summary.reclaimable_display()
        );
        let _ = writeln!(out, "  Files processed:     {}", stats.files_processed);
        let _ = writeln!(
            out,
            "  Data processed:      {}",
            ByteSize::b(stats.bytes_processed)
        );
        if summary.cache_hits > 0 {
            let _ = writeln!(out, "  Cache hits:          {}", summary.cache_hits);
        }

        if !summary.failures.is_empty() {
            let _ = writeln!(
                out,
                "  {}",
                self.paint(&format!("Skipped {} unreadable files:", summary.failures.len()), FAILURE)
            );
            for failure in &summary.failures {
                let _ = writeln!(out, "    {}: {}", failure.path.display(), failure.error);
            }
        }
        if summary.interrupted {
            let _ = writeln!(
                out,
                "  {}",
                self.paint(
                    &format!(
                        "Interrupted: {} size groups not examined",
                        summary.skipped_groups
                    ),
                    FAILURE
                )
            );
        }
        let _ = writeln!(out, "  Took {:.2}s", summary.duration_secs);
    }
}
