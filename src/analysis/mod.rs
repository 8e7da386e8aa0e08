//! Vote-matrix analysis: construction, 2-D projection and clustering.
//!
//! # Architecture
//! [`VoteMatrix`] is built once per run. [`project_2d`] and
//! [`kmeans_clustering`] both read that same matrix and run concurrently.
//! [`analyze`] joins their outputs through the matrix's own row index, so
//! every [`Placement`] carries the legislator id its row came from.

mod clustering;
mod error;
mod matrix;
mod reduction;
mod similarity;

pub use clustering::{
    DEFAULT_CLUSTER_COUNT, DEFAULT_SEED, FewerRowsPolicy, KMeansOptions, KMeansResult,
    assign_to_nearest_centroid, kmeans_clustering, squared_distance,
};
pub use error::AnalysisError;
pub use matrix::VoteMatrix;
pub use reduction::{DegeneratePolicy, EMBEDDING_COMPONENTS, PcaOptions, Projection, project_2d};
pub use similarity::{PLACEHOLDER_RANGE, SimilarityMode, similarity_scores};

use crate::types::{ClusterId, LegislatorId};
use serde::Serialize;

/// Everything one run needs to know about the numeric stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisOptions {
    pub pca: PcaOptions,
    pub kmeans: KMeansOptions,
    pub similarity: SimilarityMode,
}

/// Per-legislator output of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub legislator_id: LegislatorId,
    pub cluster_id: ClusterId,
    pub x: f64,
    pub y: f64,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// One entry per matrix row, in row order.
    pub placements: Vec<Placement>,
    pub effective_k: usize,
    pub explained_variance_ratio: [f64; EMBEDDING_COMPONENTS],
    /// Set when the projection had to be zero padded.
    pub degenerate: bool,
    pub iterations: usize,
    pub inertia: f64,
}

/// Reduce and cluster `matrix`, then combine the results per legislator.
pub fn analyze(matrix: &VoteMatrix, options: &AnalysisOptions) -> Result<Analysis, AnalysisError> {
    if matrix.is_empty() {
        return Err(AnalysisError::EmptyMatrix);
    }

    let (projection, clusters) = rayon::join(
        || project_2d(matrix, &options.pca),
        || kmeans_clustering(matrix, &options.kmeans),
    );
    let projection = projection?;
    let clusters = clusters?;

    let scores = similarity_scores(matrix, &clusters, options.similarity, options.kmeans.seed);

    debug_assert_eq!(projection.coordinates.len(), matrix.rows());
    debug_assert_eq!(clusters.assignments.len(), matrix.rows());

    let placements = matrix
        .legislator_ids()
        .iter()
        .zip(&projection.coordinates)
        .zip(&clusters.assignments)
        .zip(&scores)
        .map(|(((legislator_id, xy), &cluster_id), &similarity)| Placement {
            legislator_id: legislator_id.clone(),
            cluster_id,
            x: xy[0],
            y: xy[1],
            similarity,
        })
        .collect();

    Ok(Analysis {
        placements,
        effective_k: clusters.effective_k,
        explained_variance_ratio: projection.explained_variance_ratio,
        degenerate: projection.is_degenerate(),
        iterations: clusters.iterations,
        inertia: clusters.inertia,
    })
}
