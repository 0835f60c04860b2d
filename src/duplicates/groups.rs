//! Size partitioning and duplicate group types.
//!
//! # Overview
//!
//! Size partitioning is the first stage of classification: files of
//! different sizes can never be duplicates, so every later comparison
//! happens inside one [`SizeGroup`]. Groups keep the order in which their
//! members were enumerated, and groups themselves are ordered by the first
//! appearance of their size. That order decides which file becomes the
//! original of a duplicate group.
//!
//! # Example
//!
//! ```
//! use dupe_eraser::scanner::FileCandidate;
//! use dupe_eraser::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileCandidate::new(PathBuf::from("/file1.txt"), 1024, None),
//!     FileCandidate::new(PathBuf::from("/file2.txt"), 2048, None),
//!     FileCandidate::new(PathBuf::from("/file3.txt"), 1024, None),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].files[1].path, PathBuf::from("/file3.txt"));
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::scanner::FileCandidate;

/// Files sharing one exact size, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Files with this exact size
    pub files: Vec<FileCandidate>,
}

impl SizeGroup {
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Upper bound on reclaimable space if every member but one went away.
    #[must_use]
    pub fn potential_savings(&self) -> u64 {
        self.size * (self.files.len().saturating_sub(1) as u64)
    }
}

/// Which test admitted a duplicate into its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Fingerprints were equal.
    Fingerprint,
    /// Fingerprints were equal and the bytes were compared.
    Verified,
    /// Perceptual hashes were within the distance threshold.
    Perceptual,
}

/// A duplicate of a group's original, with the test it passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    #[serde(flatten)]
    pub file: FileCandidate,
    pub matched_by: MatchKind,
}

/// An original file and every file judged a duplicate of it.
///
/// Only built with at least one duplicate; the original is the earliest
/// enumerated member of its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Shared file size in bytes
    pub size: u64,
    /// The file that is kept
    pub original: FileCandidate,
    /// Duplicates of `original`, in enumeration order
    pub duplicates: Vec<DuplicateEntry>,
}

impl DuplicateGroup {
    /// Build a group; `None` when `duplicates` is empty.
    #[must_use]
    pub fn new(original: FileCandidate, duplicates: Vec<DuplicateEntry>) -> Option<Self> {
        if duplicates.is_empty() {
            return None;
        }
        Some(Self {
            size: original.size,
            original,
            duplicates,
        })
    }

    /// Number of duplicates (the original is not counted).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// Bytes held by the duplicates.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.duplicates.iter().map(|d| d.file.size).sum()
    }

    /// Paths of the original followed by its duplicates.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        std::iter::once(self.original.path.clone())
            .chain(self.duplicates.iter().map(|d| d.file.path.clone()))
            .collect()
    }
}

/// Statistics from the size partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of size groups with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size alone.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Partition candidates by exact size, dropping singletons.
///
/// Empty files are kept: any two of them are byte-identical.
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileCandidate>,
) -> (Vec<SizeGroup>, GroupingStats) {
    let mut order: Vec<SizeGroup> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;

        match index.get(&file.size) {
            Some(&i) => order[i].files.push(file),
            None => {
                index.insert(file.size, order.len());
                order.push(SizeGroup {
                    size: file.size,
                    files: vec![file],
                });
            }
        }
    }

    stats.unique_sizes = order.len();

    let groups: Vec<SizeGroup> = order
        .into_iter()
        .filter(|group| {
            if group.files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique size {}: {}",
                    group.size,
                    group.files[0].path.display()
                );
                false
            } else {
                stats.potential_duplicates += group.files.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size group {} bytes: {} potential duplicates",
                    group.size,
                    group.files.len()
                );
                true
            }
        })
        .collect();

    log::info!(
        "Size partition complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (groups, stats)
}
