//! Perceptual image hashing for similarity detection.
//!
//! This module provides the `PerceptualHasher` which can compute hashes
//! for images that remain stable under common transformations like
//! resizing and recompression. Hashes are compared by Hamming distance.

use image_hasher::{HashAlg, HasherConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::HashError;

/// Default Hamming distance at or below which two images are considered
/// the same picture.
pub const DEFAULT_THRESHOLD: u32 = 5;

/// File extensions treated as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

/// Supported perceptual hashing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PerceptualAlgorithm {
    /// aHash (Average Hash) - Mean-based, fast but less resilient.
    Ahash,
    /// dHash (Difference Hash) - Gradient-based, very fast and effective.
    Dhash,
    /// pHash (Perceptual Hash) - DCT-based, most resilient to transformations.
    #[default]
    Phash,
    /// Blockhash - Block mean comparison, robust to small crops.
    Blockhash,
}

impl PerceptualAlgorithm {
    /// Every perceptual algorithm, in listing order.
    pub const ALL: [Self; 4] = [Self::Ahash, Self::Dhash, Self::Phash, Self::Blockhash];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ahash => "ahash",
            Self::Dhash => "dhash",
            Self::Phash => "phash",
            Self::Blockhash => "blockhash",
        }
    }
}

impl std::fmt::Display for PerceptualAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PerceptualAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| {
                format!("unknown perceptual algorithm '{s}' (expected ahash, dhash, phash or blockhash)")
            })
    }
}

/// Whether `path` carries one of the [`IMAGE_EXTENSIONS`].
#[must_use]
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Computes perceptual hashes for images.
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
    algorithm: PerceptualAlgorithm,
}

impl PerceptualHasher {
    /// Create a new `PerceptualHasher` with the given algorithm.
    pub fn new(algorithm: PerceptualAlgorithm) -> Self {
        let config = HasherConfig::new();
        let config = match algorithm {
            PerceptualAlgorithm::Ahash => config.hash_alg(HashAlg::Mean),
            PerceptualAlgorithm::Dhash => config.hash_alg(HashAlg::Gradient),
            PerceptualAlgorithm::Phash => config.hash_alg(HashAlg::Median).preproc_dct(),
            PerceptualAlgorithm::Blockhash => config.hash_alg(HashAlg::Blockhash),
        };

        Self {
            hasher: config.to_hasher(),
            algorithm,
        }
    }

    /// Decode the image at `path` and return its hash bits.
    pub fn hash_bits(&self, path: &Path) -> Result<Vec<u8>, HashError> {
        let img = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(io) => HashError::from_io(path, io),
            other => HashError::Image {
                path: path.to_path_buf(),
                source: other,
            },
        })?;

        Ok(self.hasher.hash_image(&img).as_bytes().to_vec())
    }

    /// Get the algorithm used by this hasher.
    pub fn algorithm(&self) -> PerceptualAlgorithm {
        self.algorithm
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(PerceptualAlgorithm::default())
    }
}
