//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based partitioning ([`groups`])
//! - Fingerprint classification with optional verification ([`classifier`])
//! - Byte-exact comparison of fingerprint matches ([`verify`])

pub mod classifier;
pub mod groups;
pub mod verify;

pub use classifier::{
    classify, Classifier, ClassifierConfig, ClassifySummary, FingerprintFailure,
    PerceptualFallback, DEFAULT_IO_THREADS,
};
pub use groups::{group_by_size, DuplicateEntry, DuplicateGroup, GroupingStats, MatchKind, SizeGroup};
pub use verify::files_identical;
