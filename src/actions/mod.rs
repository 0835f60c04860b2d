//! Duplicate resolution.
//!
//! - [`resolve`]: applies a [`Policy`] to classified groups
//! - [`delete`]: permanent removal with scan-time verification
//! - [`quarantine`]: collision-free moves into a safe directory
//!
//! ```no_run
//! use dupe_eraser::actions::{resolve, Policy};
//! use dupe_eraser::stats::RunStatistics;
//! use std::path::Path;
//!
//! let stats = RunStatistics::new();
//! let outcomes = resolve(&[], Policy::Report, Path::new("safe"), &stats);
//! assert!(outcomes.is_empty());
//! ```

pub mod delete;
pub mod quarantine;
pub mod resolve;

pub use delete::{delete_file, DeleteError, FileSnapshot};
pub use quarantine::{claim_unique_target, quarantine_file, QuarantineError};
pub use resolve::{
    resolve, Action, Policy, ResolutionExecutor, ResolutionOutcome, DEFAULT_QUARANTINE_DIR,
};
