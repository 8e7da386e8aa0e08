//! Per-legislator confidence in the assigned cluster.

use super::clustering::KMeansResult;
use super::matrix::VoteMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Range of the legacy placeholder score.
pub const PLACEHOLDER_RANGE: Range<f64> = 0.7..0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMode {
    /// `1 / (1 + d)` with `d` the Euclidean distance to the assigned centroid.
    #[default]
    Centroid,
    /// Seeded uniform draw in [`PLACEHOLDER_RANGE`], kept for output compatibility.
    Placeholder,
}

/// Score every matrix row, in row order.
pub fn similarity_scores(
    matrix: &VoteMatrix,
    clusters: &KMeansResult,
    mode: SimilarityMode,
    seed: u64,
) -> Vec<f64> {
    match mode {
        SimilarityMode::Centroid => matrix
            .iter_rows()
            .zip(&clusters.assignments)
            .map(|(row, &cluster)| 1.0 / (1.0 + clusters.distance_to_centroid(row, cluster)))
            .collect(),
        SimilarityMode::Placeholder => {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..matrix.rows())
                .map(|_| rng.random_range(PLACEHOLDER_RANGE))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::clustering::{KMeansOptions, kmeans_clustering};
    use crate::types::{BillId, LegislatorId};

    fn fixture() -> (VoteMatrix, KMeansResult) {
        let m = VoteMatrix::from_dense(
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            vec![BillId::from("X"), BillId::from("Y")],
            vec![
                vec![1.0, 1.0],
                vec![1.0, 0.0],
                vec![-1.0, -1.0],
                vec![-1.0, -1.0],
            ],
        );
        let options = KMeansOptions {
            k: 2,
            ..KMeansOptions::default()
        };
        let clusters = kmeans_clustering(&m, &options).unwrap();
        (m, clusters)
    }

    #[test]
    fn test_centroid_scores() {
        let (m, clusters) = fixture();
        let scores = similarity_scores(&m, &clusters, SimilarityMode::Centroid, 42);

        assert_eq!(scores.len(), 4);
        assert!(scores.iter().all(|s| *s > 0.0 && *s <= 1.0));
        // C and D sit exactly on their centroid
        let c = m.row_of(&LegislatorId::from("C")).unwrap();
        assert!((scores[c] - 1.0).abs() < 1e-12);
        // A and B are each half a vote away from theirs
        assert!((scores[0] - 1.0 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_placeholder_scores_are_seeded() {
        let (m, clusters) = fixture();
        let a = similarity_scores(&m, &clusters, SimilarityMode::Placeholder, 7);
        let b = similarity_scores(&m, &clusters, SimilarityMode::Placeholder, 7);

        assert_eq!(a, b);
        assert!(a.iter().all(|s| PLACEHOLDER_RANGE.contains(s)));
    }
}
