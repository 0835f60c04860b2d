//! Layered run configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults ([`Settings::default`])
//! 2. a TOML file: `--config PATH`, else `config.toml` in the platform
//!    config directory
//! 3. `DUPE_ERASER_*` environment variables (`__` separates nested keys)
//! 4. command-line flags
//!
//! The merged [`Settings`] are still raw; [`Settings::validate`] resolves
//! names and paths into a [`RunConfig`] before any file is touched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::{Policy, DEFAULT_QUARANTINE_DIR};
use crate::duplicates::{ClassifierConfig, PerceptualFallback, DEFAULT_IO_THREADS};
use crate::scanner::perceptual::DEFAULT_THRESHOLD;
use crate::scanner::{Algorithm, PerceptualAlgorithm, UnsupportedAlgorithm};
use crate::stats::RunStatistics;

/// Prefix of environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "DUPE_ERASER_";

/// Largest meaningful Hamming distance for the 64-bit perceptual hashes.
pub const MAX_PERCEPTUAL_THRESHOLD: u32 = 64;

/// Errors detected before scanning starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid root directory {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    #[error("--delete and --quarantine cannot be combined")]
    IncompatiblePolicies,

    #[error("perceptual threshold {0} is out of range (0..={MAX_PERCEPTUAL_THRESHOLD})")]
    InvalidThreshold(u32),

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Raw settings as merged from every source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fingerprint algorithm name, resolved by [`Settings::validate`].
    pub algorithm: String,
    pub recursive: bool,
    pub shallow_check: bool,
    pub perceptual: bool,
    pub perceptual_algorithm: PerceptualAlgorithm,
    pub perceptual_threshold: u32,
    /// Files above this many MiB report per-file hashing progress.
    pub progress_threshold_mb: u64,
    pub io_threads: usize,
    /// Relative paths are resolved against the scan root.
    pub quarantine_dir: Option<PathBuf>,
    pub policy: Policy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default().name().to_string(),
            recursive: false,
            shallow_check: false,
            perceptual: false,
            perceptual_algorithm: PerceptualAlgorithm::default(),
            perceptual_threshold: DEFAULT_THRESHOLD,
            progress_threshold_mb: 10,
            io_threads: DEFAULT_IO_THREADS,
            quarantine_dir: None,
            policy: Policy::Report,
        }
    }
}

/// Values given on the command line; unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shallow_check: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceptual: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceptual_algorithm: Option<PerceptualAlgorithm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceptual_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_threshold_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
}

/// Map the `--delete` / `--quarantine` switches onto a policy.
///
/// # Errors
///
/// [`ConfigError::IncompatiblePolicies`] when both are set.
pub fn policy_from_flags(delete: bool, quarantine: bool) -> Result<Option<Policy>, ConfigError> {
    match (delete, quarantine) {
        (true, true) => Err(ConfigError::IncompatiblePolicies),
        (true, false) => Ok(Some(Policy::Delete)),
        (false, true) => Ok(Some(Policy::Quarantine)),
        (false, false) => Ok(None),
    }
}

impl Settings {
    /// `config.toml` in the platform config directory, if one can be named.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupe-eraser").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The provider stack without the command-line layer.
    #[must_use]
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match config_file {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                if let Some(path) = Self::default_config_path() {
                    figment = figment.merge(Toml::file(path));
                }
            }
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Merge every layer, command line last.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Load`] for malformed files or values. An explicitly
    /// named file that does not exist is an error; a missing default file
    /// is not.
    pub fn load(
        config_file: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(figment::Error::from(format!(
                    "config file {} not found",
                    path.display()
                ))
                .into());
            }
        }
        let settings = Self::figment(config_file)
            .merge(Serialized::defaults(overrides))
            .extract()?;
        log::debug!("Effective settings: {:?}", settings);
        Ok(settings)
    }

    /// Resolve into a [`RunConfig`] for scanning `root`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidRoot`] if `root` is not an accessible directory
    /// - [`ConfigError::UnsupportedAlgorithm`] for unknown algorithm names
    /// - [`ConfigError::InvalidThreshold`] for thresholds above
    ///   [`MAX_PERCEPTUAL_THRESHOLD`]
    pub fn validate(&self, root: &Path) -> Result<RunConfig, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRoot {
            path: root.to_path_buf(),
            reason,
        };
        let root = root.canonicalize().map_err(|e| invalid(e.to_string()))?;
        if !root.is_dir() {
            return Err(invalid("not a directory".to_string()));
        }

        let algorithm: Algorithm = self.algorithm.parse()?;

        if self.perceptual_threshold > MAX_PERCEPTUAL_THRESHOLD {
            return Err(ConfigError::InvalidThreshold(self.perceptual_threshold));
        }
        let perceptual = self.perceptual.then_some(PerceptualFallback {
            algorithm: self.perceptual_algorithm,
            threshold: self.perceptual_threshold,
        });

        let quarantine_dir = match &self.quarantine_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.join(DEFAULT_QUARANTINE_DIR),
        };

        Ok(RunConfig {
            root,
            algorithm,
            recursive: self.recursive,
            shallow_check: self.shallow_check,
            perceptual,
            progress_threshold: self.progress_threshold_mb.saturating_mul(1024 * 1024),
            io_threads: self.io_threads.max(1),
            quarantine_dir,
            policy: self.policy,
        })
    }
}

/// Validated configuration of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Canonical scan root.
    pub root: PathBuf,
    pub algorithm: Algorithm,
    pub recursive: bool,
    pub shallow_check: bool,
    pub perceptual: Option<PerceptualFallback>,
    /// In bytes.
    pub progress_threshold: u64,
    pub io_threads: usize,
    /// Absolute; excluded from the scan.
    pub quarantine_dir: PathBuf,
    pub policy: Policy,
}

impl RunConfig {
    /// Classifier settings for this run.
    #[must_use]
    pub fn classifier_config(&self, stats: Arc<RunStatistics>) -> ClassifierConfig {
        let mut config = ClassifierConfig::new(self.algorithm)
            .with_shallow_check(self.shallow_check)
            .with_io_threads(self.io_threads)
            .with_progress_threshold(self.progress_threshold)
            .with_stats(stats);
        if let Some(fallback) = self.perceptual {
            config = config.with_perceptual(fallback.algorithm, fallback.threshold);
        }
        config
    }
}
