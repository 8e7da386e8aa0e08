use tantivy::TantivyError;
use tantivy::directory::error::OpenDirectoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] TantivyError),

    #[error("Directory error: {0}")]
    Directory(#[from] OpenDirectoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Rejected result for legislator '{legislator_id}': {reason}")]
    InvalidResult {
        legislator_id: String,
        reason: String,
    },

    #[error("Result store appears to be corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Another writer, in this process or another, holds the index lock.
    #[error("Result store is locked by another writer")]
    WriterBusy,
}

pub type StorageResult<T> = Result<T, StorageError>;
