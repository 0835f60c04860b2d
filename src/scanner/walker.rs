//! Directory enumeration built on walkdir.
//!
//! # Overview
//!
//! [`scan`] validates the root and returns a [`FileEnumerator`], a lazy,
//! single-pass iterator over the regular files below it. Siblings are
//! visited in file-name order, so two scans of an unchanged tree enumerate
//! (and pick originals) identically.
//!
//! # Behavior
//!
//! - The quarantine directory is pruned from the walk, wherever it sits
//! - Non-recursive mode visits only the root's direct entries
//! - Symlinks count as files when they resolve to a regular file; broken
//!   links are skipped and links to directories are not followed
//! - Each underlying file is yielded once, no matter how many hard links
//!   or symlinks name it
//! - Per-entry errors are yielded as [`ScanError`] values and never stop
//!   the walk
//!
//! # Example
//!
//! ```no_run
//! use dupe_eraser::scanner::scan;
//! use std::path::Path;
//!
//! let files: Vec<_> = scan(Path::new("."), false, None)
//!     .unwrap()
//!     .filter_map(Result::ok)
//!     .collect();
//! println!("Found {} files", files.len());
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::hardlink::LinkTracker;
use super::{FileCandidate, ScanError};

/// Validate `root` and start enumerating the files below it.
///
/// # Errors
///
/// - [`ScanError::NotFound`] if `root` does not exist
/// - [`ScanError::NotADirectory`] if `root` is not a directory
/// - [`ScanError::PermissionDenied`] / [`ScanError::Io`] if it cannot be read
pub fn scan(
    root: &Path,
    recursive: bool,
    quarantine_dir: Option<&Path>,
) -> Result<FileEnumerator, ScanError> {
    let metadata = fs::metadata(root).map_err(|e| io_to_scan_error(root, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let root = root
        .canonicalize()
        .map_err(|e| io_to_scan_error(root, e))?;

    let quarantine = quarantine_dir.map(absolutize);
    if let Some(q) = &quarantine {
        log::debug!("Excluding quarantine directory {}", q.display());
    }

    let mut walk = WalkDir::new(&root).follow_links(false).sort_by_file_name();
    if !recursive {
        walk = walk.max_depth(1);
    }

    log::info!(
        "Enumerating {} ({})",
        root.display(),
        if recursive { "recursive" } else { "top level only" }
    );

    Ok(FileEnumerator {
        entries: walk.into_iter(),
        root,
        quarantine,
        tracker: LinkTracker::new(),
        shutdown_flag: None,
        yielded: 0,
    })
}

/// Lazy, non-restartable iterator over the regular files under a root.
///
/// Created by [`scan`]. Iteration consumes it; scan again for a fresh pass.
pub struct FileEnumerator {
    root: PathBuf,
    entries: walkdir::IntoIter,
    quarantine: Option<PathBuf>,
    tracker: LinkTracker,
    shutdown_flag: Option<Arc<AtomicBool>>,
    yielded: u64,
}

impl FileEnumerator {
    /// Stop yielding entries once `flag` becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Canonical root being enumerated.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn is_quarantine(&self, path: &Path) -> bool {
        self.quarantine.as_deref().is_some_and(|q| q == path)
    }

    fn walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        match error.into_io_error() {
            Some(io) => {
                let err = io_to_scan_error(&path, io);
                log::warn!("{}", err);
                err
            }
            None => {
                // walkdir only reports non-I/O errors for link loops
                log::warn!("Filesystem loop at {}", path.display());
                ScanError::Io {
                    path,
                    source: std::io::Error::other("filesystem loop detected"),
                }
            }
        }
    }
}

impl Iterator for FileEnumerator {
    type Item = Result<FileCandidate, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.is_shutdown_requested() {
                log::debug!("Enumeration stopped after {} files", self.yielded);
                return None;
            }

            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(self.walk_error(e))),
            };

            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                if self.is_quarantine(entry.path()) {
                    log::debug!("Pruning quarantine directory {}", entry.path().display());
                    self.entries.skip_current_dir();
                }
                continue;
            }

            let metadata = if file_type.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(m) => m,
                    Err(e) => {
                        log::debug!("Skipping broken symlink {}: {}", entry.path().display(), e);
                        continue;
                    }
                }
            } else {
                match entry.metadata() {
                    Ok(m) => m,
                    Err(e) => return Some(Err(self.walk_error(e))),
                }
            };

            if !metadata.is_file() {
                log::trace!("Skipping non-regular entry {}", entry.path().display());
                continue;
            }

            if !self.tracker.first_sighting(&metadata) {
                log::debug!("Skipping additional link {}", entry.path().display());
                continue;
            }

            log::trace!("Found {} ({} bytes)", entry.path().display(), metadata.len());
            self.yielded += 1;
            return Some(Ok(FileCandidate::new(
                entry.into_path(),
                metadata.len(),
                metadata.modified().ok(),
            )));
        }
    }
}

/// Make `path` absolute, canonicalizing when it already exists.
fn absolutize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

fn io_to_scan_error(path: &Path, error: std::io::Error) -> ScanError {
    match error.kind() {
        std::io::ErrorKind::NotFound => ScanError::NotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(path.to_path_buf()),
        _ => ScanError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
