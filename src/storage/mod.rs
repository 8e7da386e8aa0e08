//! Persistence of clustering results.
//!
//! - [`ResultStore`]: tantivy index holding the latest result set
//! - [`ResultReader`]: ordered, identity-joined view of that set

pub mod error;
pub mod reader;
pub mod results;

pub use error::{StorageError, StorageResult};
pub use reader::{ClusterSummary, ClusteringView, ResultReader, view_order};
pub use results::{
    ClusteringResult, DEFAULT_MODEL_VERSION, ResultStore, RunMetadata, StoreWriter,
};
