//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success
//! - `1`: General error - unspecified failure
//! - `3`: Nothing to show, or the source had no usable votes
//! - `4-9`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::CaucusError;
use crate::storage::StorageError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// No results stored, or no votes to cluster (code 3)
    NotFound = 3,

    /// Reduction or clustering refused the votes (code 4)
    AnalysisRejected = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Result store corruption detected (code 7)
    StoreCorrupted = 7,

    /// Another refresh holds the gate (code 9)
    Busy = 9,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Convert a `CaucusError` to the appropriate exit code.
    pub fn from_error(error: &CaucusError) -> Self {
        match error {
            CaucusError::InputUnavailable(_) => ExitCode::IoError,
            CaucusError::Analysis(_) => ExitCode::AnalysisRejected,
            CaucusError::Store(StorageError::Corrupted { .. }) => ExitCode::StoreCorrupted,
            CaucusError::Store(StorageError::WriterBusy) => ExitCode::Busy,
            CaucusError::PersistenceFailure(_) | CaucusError::Store(_) => ExitCode::IoError,
            CaucusError::RefreshInProgress => ExitCode::Busy,
            CaucusError::Config { .. } => ExitCode::ConfigError,
        }
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::NotFound => "Not found",
            ExitCode::AnalysisRejected => "Analysis rejected the votes",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::StoreCorrupted => "Result store corrupted",
            ExitCode::Busy => "Refresh already running",
        }
    }
}
