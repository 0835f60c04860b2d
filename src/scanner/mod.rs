//! Scanner module for directory traversal and file fingerprinting.
//!
//! This module provides functionality for:
//! - Directory enumeration with quarantine pruning and link deduplication
//! - Streaming content fingerprints (strong, fast and perceptual families)
//! - Hardlink and symlink identity tracking
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`algorithm`]: The closed set of supported fingerprint algorithms
//! - [`hasher`]: Streaming fingerprint computation
//! - [`perceptual`]: Perceptual image hashing
//! - [`hardlink`]: Inode identity tracking
//!
//! # Example
//!
//! ```no_run
//! use dupe_eraser::scanner::scan;
//! use std::path::Path;
//!
//! let enumerator = scan(Path::new("."), true, None).unwrap();
//! for entry in enumerator {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod algorithm;
pub mod hardlink;
pub mod hasher;
pub mod perceptual;
pub mod walker;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

pub use algorithm::{Algorithm, FastAlgorithm, HashFamily, StrongAlgorithm, UnsupportedAlgorithm};
pub use hasher::{FingerprintComputer, Fingerprinter, HASH_CHUNK_SIZE};
pub use perceptual::PerceptualAlgorithm;
pub use walker::{scan, FileEnumerator};

/// A regular file discovered during enumeration.
///
/// Candidates are immutable once created; the classifier and the
/// resolution pass only ever read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCandidate {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time, when the platform reports one
    #[serde(skip)]
    pub modified: Option<SystemTime>,
}

impl FileCandidate {
    /// Create a new candidate.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            path,
            size,
            modified,
        }
    }

    /// Build a candidate from the current metadata of `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        Ok(Self {
            size: metadata.len(),
            modified: metadata.modified().ok(),
            path,
        })
    }
}

/// A content fingerprint.
///
/// Two fingerprints are equal only when they are of the same kind, were
/// produced by the same algorithm, and carry identical bytes.
/// [`Fingerprint::NotApplicable`] is never equal to anything, itself
/// included, so a non-image can never match under a perceptual algorithm.
#[derive(Debug, Clone)]
pub enum Fingerprint {
    /// Cryptographic digest of the full content.
    Strong {
        algorithm: StrongAlgorithm,
        digest: Vec<u8>,
    },
    /// Non-cryptographic digest of the full content.
    Fast {
        algorithm: FastAlgorithm,
        digest: Vec<u8>,
    },
    /// Perceptual image hash, compared by Hamming distance.
    Perceptual {
        algorithm: PerceptualAlgorithm,
        bits: Vec<u8>,
    },
    /// A perceptual algorithm was asked to fingerprint a non-image.
    NotApplicable,
}

impl Fingerprint {
    /// Hamming distance between two perceptual fingerprints of the same
    /// algorithm and width. `None` for any other pairing.
    #[must_use]
    pub fn hamming_distance(&self, other: &Self) -> Option<u32> {
        match (self, other) {
            (
                Self::Perceptual {
                    algorithm: a,
                    bits: x,
                },
                Self::Perceptual {
                    algorithm: b,
                    bits: y,
                },
            ) if a == b && x.len() == y.len() => {
                Some(x.iter().zip(y).map(|(l, r)| (l ^ r).count_ones()).sum())
            }
            _ => None,
        }
    }

    /// Raw fingerprint bytes; empty for [`Fingerprint::NotApplicable`].
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Strong { digest, .. } | Self::Fast { digest, .. } => digest,
            Self::Perceptual { bits, .. } => bits,
            Self::NotApplicable => &[],
        }
    }

    /// Lowercase hex rendering of [`Fingerprint::as_bytes`].
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.as_bytes().iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Strong {
                    algorithm: a,
                    digest: x,
                },
                Self::Strong {
                    algorithm: b,
                    digest: y,
                },
            ) => a == b && x == y,
            (
                Self::Fast {
                    algorithm: a,
                    digest: x,
                },
                Self::Fast {
                    algorithm: b,
                    digest: y,
                },
            ) => a == b && x == y,
            (
                Self::Perceptual {
                    algorithm: a,
                    bits: x,
                },
                Self::Perceptual {
                    algorithm: b,
                    bits: y,
                },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong { algorithm, .. } => write!(f, "{}:{}", algorithm, self.to_hex()),
            Self::Fast { algorithm, .. } => write!(f, "{}:{}", algorithm, self.to_hex()),
            Self::Perceptual { algorithm, .. } => write!(f, "{}:{}", algorithm, self.to_hex()),
            Self::NotApplicable => write!(f, "n/a"),
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while fingerprinting a single file.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file has an image extension but could not be decoded.
    #[error("Failed to decode image {path}: {source}")]
    Image {
        /// Path of the image
        path: PathBuf,
        /// The underlying decoder error
        #[source]
        source: image::ImageError,
    },
}

impl HashError {
    /// Map an I/O error for `path` onto the matching variant.
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// The path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } | Self::Image { path, .. } => path,
        }
    }
}
