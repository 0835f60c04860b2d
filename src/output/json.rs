//! JSON rendering of a [`RunReport`].
//!
//! The report serializes as-is. Abridged shape:
//!
//! ```json
//! {
//!   "root": "/data",
//!   "algorithm": "sha256",
//!   "policy": "delete",
//!   "generated_at": "2024-05-01T12:00:00Z",
//!   "groups": [
//!     {
//!       "size": 5,
//!       "original": { "path": "/data/a", "size": 5 },
//!       "duplicates": [{ "path": "/data/b", "size": 5, "matched_by": "fingerprint" }]
//!     }
//!   ],
//!   "outcomes": [
//!     { "path": "/data/b", "original": "/data/a", "action": "deleted", "bytes_reclaimed": 5 }
//!   ],
//!   "summary": { "duplicate_groups": 1, "interrupted": false },
//!   "stats": { "bytes_saved": 5, "algorithms": [] },
//!   "exit_code": 0,
//!   "exit_code_name": "DE000"
//! }
//! ```

use std::io::Write;

use super::RunReport;

/// JSON renderer.
#[derive(Debug, Clone, Copy)]
pub struct JsonOutput<'a> {
    report: &'a RunReport,
}

impl<'a> JsonOutput<'a> {
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        Self { report }
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self.report)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self.report)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(&mut writer, self.report)?;
        writeln!(writer).map_err(serde_json::Error::io)
    }
}
