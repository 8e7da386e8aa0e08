//! K-means partitioning of legislators by voting pattern.
//!
//! Pure Rust K-means over the rows of a [`VoteMatrix`], using squared
//! Euclidean distance and K-means++ seeding. Every random draw comes from a
//! `StdRng` derived from the configured seed, so identical input and seed
//! always give identical labels.
//!
//! # Algorithm Details
//! - Distance metric: squared Euclidean
//! - Initialization: K-means++, repeated `n_init` times, lowest inertia wins
//! - Empty clusters keep their previous centroid
//! - Stops when assignments are stable or centroids move less than the tolerance

use super::error::AnalysisError;
use super::matrix::VoteMatrix;
use crate::types::ClusterId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Cluster count used when nothing else is configured.
pub const DEFAULT_CLUSTER_COUNT: usize = 5;

/// Seed used when nothing else is configured.
pub const DEFAULT_SEED: u64 = 42;

/// Epsilon for floating-point comparisons.
const EPSILON: f64 = 1e-12;

/// What to do when there are fewer legislators than clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FewerRowsPolicy {
    /// Run with `k = rows` instead.
    #[default]
    Shrink,
    /// Report [`AnalysisError::DegenerateMatrix`].
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansOptions {
    pub k: usize,
    pub seed: u64,
    pub n_init: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub when_fewer_rows: FewerRowsPolicy,
}

impl Default for KMeansOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_CLUSTER_COUNT,
            seed: DEFAULT_SEED,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-6,
            when_fewer_rows: FewerRowsPolicy::Shrink,
        }
    }
}

/// Result of K-means clustering operation.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster centroids in vote space, indexed by cluster id.
    pub centroids: Vec<Vec<f64>>,

    /// Cluster assignment for each matrix row, in row order.
    pub assignments: Vec<ClusterId>,

    /// Iterations used by the winning run.
    pub iterations: usize,

    /// Sum of squared distances from each row to its centroid.
    pub inertia: f64,

    /// Cluster count actually used; below the configured `k` after shrinking.
    pub effective_k: usize,
}

impl KMeansResult {
    /// Distance from `row` to the centroid of the cluster it was assigned.
    pub fn distance_to_centroid(&self, row: &[f64], cluster: ClusterId) -> f64 {
        squared_distance(row, &self.centroids[cluster.index()]).sqrt()
    }
}

/// Partition the rows of `matrix` into `options.k` clusters.
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn kmeans_clustering(
    matrix: &VoteMatrix,
    options: &KMeansOptions,
) -> Result<KMeansResult, AnalysisError> {
    if options.k == 0 {
        return Err(AnalysisError::InvalidClusterCount(0));
    }
    if matrix.is_empty() {
        return Err(AnalysisError::EmptyMatrix);
    }

    let rows: Vec<&[f64]> = matrix.iter_rows().collect();
    if let Some(row) = rows.iter().position(|r| r.iter().any(|v| !v.is_finite())) {
        return Err(AnalysisError::NonFiniteValue { row });
    }

    let k = if rows.len() < options.k {
        match options.when_fewer_rows {
            FewerRowsPolicy::Fail => {
                return Err(AnalysisError::DegenerateMatrix {
                    rows: rows.len(),
                    columns: matrix.columns(),
                    supported: rows.len(),
                    required: options.k,
                });
            }
            FewerRowsPolicy::Shrink => {
                tracing::warn!(
                    rows = rows.len(),
                    configured_k = options.k,
                    "fewer legislators than clusters, shrinking k"
                );
                rows.len()
            }
        }
    } else {
        options.k
    };

    // Derive one seed per restart up front so the parallel runs stay reproducible
    let mut master = StdRng::seed_from_u64(options.seed);
    let run_seeds: Vec<u64> = (0..options.n_init.max(1))
        .map(|_| master.random::<u64>())
        .collect();

    let runs: Vec<KMeansResult> = run_seeds
        .par_iter()
        .map(|&seed| single_run(&rows, k, seed, options))
        .collect();

    let mut best: Option<KMeansResult> = None;
    for run in runs {
        let improves = best
            .as_ref()
            .is_none_or(|current| run.inertia < current.inertia - EPSILON);
        if improves {
            best = Some(run);
        }
    }

    // n_init is at least one, so there is always a run
    best.ok_or(AnalysisError::EmptyMatrix)
}

fn single_run(rows: &[&[f64]], k: usize, seed: u64, options: &KMeansOptions) -> KMeansResult {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = initialize_centroids_kmeans_plus_plus(rows, k, &mut rng);
    let mut assignments: Vec<ClusterId> = Vec::new();
    let mut iterations = 0;

    loop {
        iterations += 1;

        let new_assignments: Vec<ClusterId> = rows
            .iter()
            .map(|row| assign_to_nearest_centroid(row, &centroids))
            .collect();

        let converged = new_assignments == assignments;
        assignments = new_assignments;

        if converged || iterations >= options.max_iterations {
            break;
        }

        let new_centroids = update_centroids(rows, &assignments, &centroids);
        let movement = calculate_centroid_movement(&centroids, &new_centroids);
        centroids = new_centroids;

        if movement < options.tolerance {
            // Labels must describe the final centroids
            assignments = rows
                .iter()
                .map(|row| assign_to_nearest_centroid(row, &centroids))
                .collect();
            break;
        }
    }

    if iterations >= options.max_iterations {
        tracing::debug!(
            max_iterations = options.max_iterations,
            "k-means stopped at the iteration limit"
        );
    }

    let inertia = rows
        .iter()
        .zip(&assignments)
        .map(|(row, c)| squared_distance(row, &centroids[c.index()]))
        .sum();

    KMeansResult {
        centroids,
        assignments,
        iterations,
        inertia,
        effective_k: k,
    }
}

/// Nearest centroid by squared Euclidean distance; ties go to the lower id.
pub fn assign_to_nearest_centroid(row: &[f64], centroids: &[Vec<f64>]) -> ClusterId {
    let mut best_distance = f64::INFINITY;
    let mut best_cluster = 0;

    for (i, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(row, centroid);
        if distance < best_distance {
            best_distance = distance;
            best_cluster = i;
        }
    }

    ClusterId::new(best_cluster as u32)
}

/// Mean of each cluster's rows. An empty cluster keeps its previous centroid.
fn update_centroids(
    rows: &[&[f64]],
    assignments: &[ClusterId],
    previous: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    let dimension = previous.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; dimension]; previous.len()];
    let mut sizes = vec![0usize; previous.len()];

    for (row, cluster) in rows.iter().zip(assignments) {
        let idx = cluster.index();
        for (sum, value) in sums[idx].iter_mut().zip(row.iter()) {
            *sum += value;
        }
        sizes[idx] += 1;
    }

    sums.into_iter()
        .zip(sizes)
        .zip(previous)
        .map(|((mut sum, size), old)| {
            if size == 0 {
                old.clone()
            } else {
                sum.iter_mut().for_each(|v| *v /= size as f64);
                sum
            }
        })
        .collect()
}

pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// K-means++ seeding: each next centroid is drawn with probability
/// proportional to its squared distance from the closest chosen one.
///
/// When every remaining row coincides with a chosen centroid a random row is
/// reused, so exactly `k` centroids are always returned.
fn initialize_centroids_kmeans_plus_plus(
    rows: &[&[f64]],
    k: usize,
    rng: &mut StdRng,
) -> Vec<Vec<f64>> {
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    let first = rng.random_range(0..rows.len());
    centroids.push(rows[first].to_vec());

    while centroids.len() < k {
        let distances: Vec<f64> = rows
            .iter()
            .map(|row| {
                centroids
                    .iter()
                    .map(|c| squared_distance(row, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = distances.iter().sum();

        if total < EPSILON {
            let idx = rng.random_range(0..rows.len());
            centroids.push(rows[idx].to_vec());
            continue;
        }

        let target = rng.random::<f64>() * total;
        let mut cumulative = 0.0;
        let mut chosen = None;
        for (i, &distance) in distances.iter().enumerate() {
            cumulative += distance;
            if distance > 0.0 && cumulative >= target {
                chosen = Some(i);
                break;
            }
        }

        // Rounding can leave the target just past the last cumulative sum
        let idx = chosen.unwrap_or_else(|| {
            distances
                .iter()
                .rposition(|&d| d > 0.0)
                .unwrap_or(rows.len() - 1)
        });
        centroids.push(rows[idx].to_vec());
    }

    centroids
}

fn calculate_centroid_movement(old: &[Vec<f64>], new: &[Vec<f64>]) -> f64 {
    old.iter()
        .zip(new)
        .map(|(o, n)| squared_distance(o, n))
        .sum()
}
