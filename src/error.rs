//! Error types for the clustering pipeline
//!
//! Each layer has its own `thiserror` enum (`SourceError`, `AnalysisError`,
//! `StorageError`). `CaucusError` wraps them for callers of the pipeline and
//! carries the stable status codes and recovery hints used by the CLI.

use crate::analysis::AnalysisError;
use crate::source::SourceError;
use crate::storage::StorageError;
use thiserror::Error;

/// Main error type for refresh and read operations
#[derive(Error, Debug)]
pub enum CaucusError {
    /// The vote source could not be read or parsed
    #[error("Vote input unavailable: {0}")]
    InputUnavailable(#[from] SourceError),

    /// Reduction or clustering refused the matrix
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Writing the new result set failed; the previous set is still in place
    #[error("Failed to persist clustering results: {0}")]
    PersistenceFailure(#[source] StorageError),

    /// Opening or reading the result store failed
    #[error("Result store error: {0}")]
    Store(#[from] StorageError),

    #[error("A refresh is already running")]
    RefreshInProgress,

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl CaucusError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::InputUnavailable(_) => "INPUT_UNAVAILABLE",
            Self::Analysis(inner) => inner.status_code(),
            Self::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            Self::Store(StorageError::Corrupted { .. }) => "STORE_CORRUPTED",
            Self::Store(StorageError::WriterBusy) => "STORE_BUSY",
            Self::Store(_) => "STORE_ERROR",
            Self::RefreshInProgress => "REFRESH_IN_PROGRESS",
            Self::Config { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::InputUnavailable(_) => vec![
                "Check that the vote file exists and is valid JSON",
                "Expected an object with 'legislators' and 'votes' arrays",
            ],
            Self::Analysis(AnalysisError::DegenerateMatrix { .. }) => vec![
                "Collect votes from more legislators or on more bills",
                "Set reduction.on_degenerate = \"zero_pad\" to accept a padded embedding",
            ],
            Self::Analysis(AnalysisError::InvalidClusterCount(_)) => {
                vec!["Set clustering.k to at least 1"]
            }
            Self::Analysis(_) => vec!["Check the vote input for malformed rows"],
            Self::PersistenceFailure(_) => vec![
                "The write was rolled back, the previous results are still readable",
                "Check disk space and permissions in the store directory",
            ],
            Self::Store(StorageError::Corrupted { .. }) => vec![
                "Remove the store directory and run 'caucus refresh' to rebuild it",
                "Check for disk errors or filesystem corruption",
            ],
            Self::Store(StorageError::WriterBusy) => {
                vec!["Another caucus process is writing the store, try again shortly"]
            }
            Self::Store(_) => vec!["Check that store_path points to a readable directory"],
            Self::RefreshInProgress => vec![
                "Wait for the running refresh to finish and try again",
                "Set refresh.concurrent = \"wait\" to queue refreshes instead",
            ],
            Self::Config { .. } => vec![
                "Run 'caucus config' to inspect the effective settings",
                "Run 'caucus init --force' to restore the default settings file",
            ],
        }
    }
}

/// Result type alias for pipeline operations
pub type CaucusResult<T> = Result<T, CaucusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(
            CaucusError::RefreshInProgress.status_code(),
            "REFRESH_IN_PROGRESS"
        );
        assert_eq!(
            CaucusError::from(AnalysisError::DegenerateMatrix {
                rows: 1,
                columns: 1,
                supported: 0,
                required: 2,
            })
            .status_code(),
            "DEGENERATE_MATRIX"
        );
        assert_eq!(
            CaucusError::PersistenceFailure(StorageError::Serialization("bad".to_string()))
                .status_code(),
            "PERSISTENCE_FAILURE"
        );
    }

    #[test]
    fn test_every_variant_has_suggestions() {
        let errors = [
            CaucusError::RefreshInProgress,
            CaucusError::Config {
                reason: "k".to_string(),
            },
            CaucusError::PersistenceFailure(StorageError::Serialization("bad".to_string())),
            CaucusError::Analysis(AnalysisError::EmptyMatrix),
        ];
        for error in &errors {
            assert!(!error.recovery_suggestions().is_empty(), "{error}");
        }
    }
}
