//! Legislator clustering by voting behaviour.
//!
//! Votes are pivoted into a legislator x bill matrix, projected onto two
//! principal axes for display, and grouped with seeded k-means. The latest
//! result set lives in a tantivy index and is read back ordered by cluster
//! and similarity.

pub mod analysis;
pub mod config;
pub mod display;
pub mod error;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod types;

// Explicit exports for better API clarity
pub use analysis::{Analysis, AnalysisError, AnalysisOptions, Placement, VoteMatrix, analyze};
pub use config::Settings;
pub use error::{CaucusError, CaucusResult};
pub use pipeline::{ClusteringService, RefreshOutcome, RefreshSummary};
pub use source::{
    InMemoryVoteSource, JsonVoteSource, LegislatorDirectory, Roster, SourceError, VoteSource,
};
pub use storage::{
    ClusterSummary, ClusteringResult, ClusteringView, ResultReader, ResultStore, RunMetadata,
    StorageError, StorageResult, StoreWriter,
};
pub use types::{
    BillId, ClusterId, Legislator, LegislatorId, VotePosition, VoteRecord, VoteRow,
};
