//! The closed set of fingerprint algorithms.
//!
//! Algorithm names are resolved once, when configuration is validated.
//! Everything downstream works with [`Algorithm`] values and never sees a
//! raw string again.

use super::perceptual::PerceptualAlgorithm;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use blake2::{Blake2b512, Blake2s256};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};
use xxhash_rust::{xxh3::Xxh3, xxh32::Xxh32, xxh64::Xxh64};

/// Broad family an algorithm belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashFamily {
    /// Cryptographic digests
    Strong,
    /// Non-cryptographic, throughput-oriented digests
    Fast,
    /// Image similarity hashes
    Perceptual,
}

impl fmt::Display for HashFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong => write!(f, "strong"),
            Self::Fast => write!(f, "fast"),
            Self::Perceptual => write!(f, "perceptual"),
        }
    }
}

/// Cryptographic digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrongAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    Blake2b,
    Blake2s,
    Blake3,
}

impl StrongAlgorithm {
    /// Every strong algorithm, in listing order.
    pub const ALL: [Self; 13] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha3_224,
        Self::Sha3_256,
        Self::Sha3_384,
        Self::Sha3_512,
        Self::Blake2b,
        Self::Blake2s,
        Self::Blake3,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Sha3_224 => "sha3_224",
            Self::Sha3_256 => "sha3_256",
            Self::Sha3_384 => "sha3_384",
            Self::Sha3_512 => "sha3_512",
            Self::Blake2b => "blake2b",
            Self::Blake2s => "blake2s",
            Self::Blake3 => "blake3",
        }
    }

    /// Digest width in bytes.
    #[must_use]
    pub fn output_size(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 | Self::Sha3_224 => 28,
            Self::Sha256 | Self::Sha3_256 | Self::Blake2s | Self::Blake3 => 32,
            Self::Sha384 | Self::Sha3_384 => 48,
            Self::Sha512 | Self::Sha3_512 | Self::Blake2b => 64,
        }
    }

    pub(crate) fn new_hasher(self) -> Box<dyn StreamHasher> {
        match self {
            Self::Md5 => Box::new(Crypto(Md5::new())),
            Self::Sha1 => Box::new(Crypto(Sha1::new())),
            Self::Sha224 => Box::new(Crypto(Sha224::new())),
            Self::Sha256 => Box::new(Crypto(Sha256::new())),
            Self::Sha384 => Box::new(Crypto(Sha384::new())),
            Self::Sha512 => Box::new(Crypto(Sha512::new())),
            Self::Sha3_224 => Box::new(Crypto(Sha3_224::new())),
            Self::Sha3_256 => Box::new(Crypto(Sha3_256::new())),
            Self::Sha3_384 => Box::new(Crypto(Sha3_384::new())),
            Self::Sha3_512 => Box::new(Crypto(Sha3_512::new())),
            Self::Blake2b => Box::new(Crypto(Blake2b512::new())),
            Self::Blake2s => Box::new(Crypto(Blake2s256::new())),
            Self::Blake3 => Box::new(Blake3Stream(blake3::Hasher::new())),
        }
    }
}

/// Non-cryptographic digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FastAlgorithm {
    Xxh32,
    Xxh64,
    Xxh3_64,
    Xxh3_128,
}

impl FastAlgorithm {
    /// Every fast algorithm, in listing order.
    pub const ALL: [Self; 4] = [Self::Xxh32, Self::Xxh64, Self::Xxh3_64, Self::Xxh3_128];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Xxh32 => "xxh32",
            Self::Xxh64 => "xxh64",
            Self::Xxh3_64 => "xxh3_64",
            Self::Xxh3_128 => "xxh3_128",
        }
    }

    /// Digest width in bytes.
    #[must_use]
    pub fn output_size(self) -> usize {
        match self {
            Self::Xxh32 => 4,
            Self::Xxh64 | Self::Xxh3_64 => 8,
            Self::Xxh3_128 => 16,
        }
    }

    pub(crate) fn new_hasher(self) -> Box<dyn StreamHasher> {
        match self {
            Self::Xxh32 => Box::new(Xxh32Stream(Xxh32::new(0))),
            Self::Xxh64 => Box::new(Xxh64Stream(Xxh64::new(0))),
            Self::Xxh3_64 => Box::new(Xxh3Stream {
                state: Box::new(Xxh3::new()),
                wide: false,
            }),
            Self::Xxh3_128 => Box::new(Xxh3Stream {
                state: Box::new(Xxh3::new()),
                wide: true,
            }),
        }
    }
}

/// A fingerprint algorithm from any family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Strong(StrongAlgorithm),
    Fast(FastAlgorithm),
    Perceptual(PerceptualAlgorithm),
}

impl Algorithm {
    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Strong(a) => a.name(),
            Self::Fast(a) => a.name(),
            Self::Perceptual(a) => a.name(),
        }
    }

    #[must_use]
    pub fn family(self) -> HashFamily {
        match self {
            Self::Strong(_) => HashFamily::Strong,
            Self::Fast(_) => HashFamily::Fast,
            Self::Perceptual(_) => HashFamily::Perceptual,
        }
    }

    /// Every supported algorithm grouped by family order.
    pub fn all() -> impl Iterator<Item = Self> {
        StrongAlgorithm::ALL
            .into_iter()
            .map(Self::Strong)
            .chain(FastAlgorithm::ALL.into_iter().map(Self::Fast))
            .chain(PerceptualAlgorithm::ALL.into_iter().map(Self::Perceptual))
    }

    /// Algorithms that digest raw bytes (strong and fast families).
    pub fn byte_digests() -> impl Iterator<Item = Self> {
        Self::all().filter(|a| a.family() != HashFamily::Perceptual)
    }

    /// Streaming hasher for byte-digest algorithms; `None` for perceptual.
    pub(crate) fn new_hasher(self) -> Option<Box<dyn StreamHasher>> {
        match self {
            Self::Strong(a) => Some(a.new_hasher()),
            Self::Fast(a) => Some(a.new_hasher()),
            Self::Perceptual(_) => None,
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Fast(FastAlgorithm::Xxh3_128)
    }
}

impl fmt::Display for StrongAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for FastAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// An algorithm name outside the supported set.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported algorithm '{name}'. Supported: {supported}")]
pub struct UnsupportedAlgorithm {
    /// The name as given
    pub name: String,
    /// Comma-separated list of supported names
    pub supported: String,
}

impl UnsupportedAlgorithm {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            supported: Algorithm::all()
                .map(Algorithm::name)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Lowercase and fold `-` into `_` so `SHA3-256` and `sha3_256` agree.
fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for Algorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        // a few common spellings beyond the canonical names
        let wanted = match wanted.as_str() {
            "xxh3" => "xxh3_64",
            "xxh128" => "xxh3_128",
            "sha3" => "sha3_256",
            other => other,
        };
        Self::all()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| UnsupportedAlgorithm::new(s))
    }
}

/// Incremental digest over a byte stream.
pub(crate) trait StreamHasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

struct Crypto<D>(D);

impl<D: Digest + Send> StreamHasher for Crypto<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

struct Blake3Stream(blake3::Hasher);

impl StreamHasher for Blake3Stream {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }
}

struct Xxh32Stream(Xxh32);

impl StreamHasher for Xxh32Stream {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.digest().to_be_bytes().to_vec()
    }
}

struct Xxh64Stream(Xxh64);

impl StreamHasher for Xxh64Stream {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.digest().to_be_bytes().to_vec()
    }
}

struct Xxh3Stream {
    state: Box<Xxh3>,
    wide: bool,
}

impl StreamHasher for Xxh3Stream {
    fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        if self.wide {
            self.state.digest128().to_be_bytes().to_vec()
        } else {
            self.state.digest().to_be_bytes().to_vec()
        }
    }
}
