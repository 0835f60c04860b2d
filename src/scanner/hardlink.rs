//! Identity tracking for hard links and symlinked files.
//!
//! Several directory entries can name the same underlying file: hard links
//! share an inode, and a symlink resolves to its target's inode. Treating
//! those entries as duplicates of each other would "reclaim" nothing and,
//! for a symlink, deleting the target would destroy the only real copy.
//! The walker therefore yields each underlying file once.
//!
//! On Unix the identity is the `(dev, ino)` pair. Other platforms do not
//! expose it through [`Metadata`], so every entry counts as new there.

use std::collections::HashSet;
use std::fs::Metadata;

/// Remembers which underlying files have already been yielded.
///
/// Not thread-safe; the walker owns one per enumeration.
#[derive(Debug, Default)]
pub struct LinkTracker {
    seen: HashSet<FileId>,
}

impl LinkTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the file behind `metadata` and report whether this is the
    /// first entry naming it.
    ///
    /// `metadata` must come from `std::fs::metadata` (symlinks followed) so
    /// a link and its target produce the same identity.
    pub fn first_sighting(&mut self, metadata: &Metadata) -> bool {
        match FileId::from_metadata(metadata) {
            Some(id) => self.seen.insert(id),
            None => true,
        }
    }

    /// Number of distinct files recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Whether identities are available on this platform.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}
