//! Application-level errors and exit codes.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::scanner::{HashError, ScanError};
use crate::signal::SignalError;

/// Process exit codes.
///
/// - 0: completed, duplicates found
/// - 1: unexpected failure
/// - 2: completed, no duplicates
/// - 3: completed, some files could not be hashed or resolved
/// - 4: configuration rejected before scanning
/// - 130: interrupted (Ctrl+C or timeout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NoDuplicates = 2,
    PartialSuccess = 3,
    ConfigError = 4,
    Interrupted = 130,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code, as used in `--json-errors` output.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DE000",
            Self::GeneralError => "DE001",
            Self::NoDuplicates => "DE002",
            Self::PartialSuccess => "DE003",
            Self::ConfigError => "DE004",
            Self::Interrupted => "DE130",
        }
    }
}

/// Errors that end a run early.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AppError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::ConfigError,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Exit code for an error surfaced from `run_app`.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    err.downcast_ref::<AppError>()
        .map(AppError::exit_code)
        .or_else(|| {
            err.downcast_ref::<ConfigError>()
                .map(|_| ExitCode::ConfigError)
        })
        .unwrap_or(ExitCode::GeneralError)
}

/// Error payload printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    pub code: String,
    pub exit_code: i32,
    pub message: String,
    pub interrupted: bool,
}

impl StructuredError {
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
