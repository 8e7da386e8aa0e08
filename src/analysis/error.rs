use thiserror::Error;

/// Errors raised while reducing or clustering a vote matrix.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Empty vote matrix provided\nSuggestion: Check that the vote source returned recognised positions")]
    EmptyMatrix,

    #[error(
        "Degenerate vote matrix: {rows} legislators x {columns} bills supports {supported} but {required} are required\nSuggestion: Add more legislators or bills, or switch the policy to zero_pad/shrink"
    )]
    DegenerateMatrix {
        rows: usize,
        columns: usize,
        supported: usize,
        required: usize,
    },

    #[error("Invalid cluster count: {0}\nSuggestion: Set clustering.k to at least 1")]
    InvalidClusterCount(usize),

    #[error(
        "Non-finite value in vote matrix at row {row}\nSuggestion: Vote weights must be -1, 0 or 1"
    )]
    NonFiniteValue { row: usize },
}

impl AnalysisError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::EmptyMatrix => "EMPTY_MATRIX",
            Self::DegenerateMatrix { .. } => "DEGENERATE_MATRIX",
            Self::InvalidClusterCount(_) => "INVALID_CLUSTER_COUNT",
            Self::NonFiniteValue { .. } => "NON_FINITE_VALUE",
        }
    }
}
