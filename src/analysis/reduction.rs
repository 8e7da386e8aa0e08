//! Principal-component projection of a vote matrix onto two axes.
//!
//! Axes are extracted by power iteration on `XᵀX` of the column-centred
//! matrix, applied as `Xᵀ(Xv)` so the bill x bill covariance is never built.
//! Later axes are kept orthogonal to earlier ones by Gram-Schmidt deflation.
//!
//! # Determinism
//! - Start vectors come from a `StdRng` seeded with the configured seed
//! - Each axis is oriented so its largest-magnitude score is positive

use super::error::AnalysisError;
use super::matrix::VoteMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Number of output dimensions.
pub const EMBEDDING_COMPONENTS: usize = 2;

/// Variance at or below this is treated as no signal.
const VARIANCE_EPSILON: f64 = 1e-12;

/// What to do when the matrix cannot support two informative components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Fill the missing components with 0.0 and flag the projection.
    #[default]
    ZeroPad,
    /// Report [`AnalysisError::DegenerateMatrix`].
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PcaOptions {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: u64,
    pub on_degenerate: DegeneratePolicy,
}

impl Default for PcaOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-9,
            seed: 42,
            on_degenerate: DegeneratePolicy::ZeroPad,
        }
    }
}

/// 2-D coordinates in matrix row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub coordinates: Vec<[f64; EMBEDDING_COMPONENTS]>,
    /// Share of total variance carried by each axis; 0.0 for padded axes.
    pub explained_variance_ratio: [f64; EMBEDDING_COMPONENTS],
    /// Axes that carried variance. Fewer than two means zero padding happened.
    pub components_found: usize,
}

impl Projection {
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.components_found < EMBEDDING_COMPONENTS
    }
}

/// Project every row of `matrix` onto its first two principal axes.
pub fn project_2d(matrix: &VoteMatrix, options: &PcaOptions) -> Result<Projection, AnalysisError> {
    if matrix.is_empty() {
        return Err(AnalysisError::EmptyMatrix);
    }
    if let Some(row) = matrix
        .iter_rows()
        .position(|r| r.iter().any(|v| !v.is_finite()))
    {
        return Err(AnalysisError::NonFiniteValue { row });
    }

    let n = matrix.rows();
    let centered = matrix.centered();
    let dof = (n.saturating_sub(1)).max(1) as f64;
    let total_variance: f64 = centered
        .iter()
        .flat_map(|row| row.iter())
        .map(|v| v * v)
        .sum::<f64>()
        / dof;

    let mut coordinates = vec![[0.0; EMBEDDING_COMPONENTS]; n];
    let mut ratios = [0.0; EMBEDDING_COMPONENTS];
    let mut axes: Vec<Vec<f64>> = Vec::with_capacity(EMBEDDING_COMPONENTS);

    if n >= 2 && matrix.columns() > 0 && total_variance > VARIANCE_EPSILON {
        let mut rng = StdRng::seed_from_u64(options.seed);

        for component in 0..EMBEDDING_COMPONENTS {
            let Some(axis) = principal_axis(&centered, &axes, &mut rng, options) else {
                break;
            };

            let mut scores = project(&centered, &axis);
            let variance = scores.iter().map(|s| s * s).sum::<f64>() / dof;
            if variance <= VARIANCE_EPSILON {
                break;
            }

            let mut axis = axis;
            if let Some(pivot) = largest_magnitude(&scores) {
                if pivot < 0.0 {
                    scores.iter_mut().for_each(|s| *s = -*s);
                    axis.iter_mut().for_each(|a| *a = -*a);
                }
            }

            for (coordinate, score) in coordinates.iter_mut().zip(&scores) {
                coordinate[component] = *score;
            }
            ratios[component] = variance / total_variance;
            axes.push(axis);
        }
    }

    let components_found = axes.len();
    if components_found < EMBEDDING_COMPONENTS {
        match options.on_degenerate {
            DegeneratePolicy::Fail => {
                return Err(AnalysisError::DegenerateMatrix {
                    rows: n,
                    columns: matrix.columns(),
                    supported: components_found,
                    required: EMBEDDING_COMPONENTS,
                });
            }
            DegeneratePolicy::ZeroPad => {
                tracing::warn!(
                    rows = n,
                    columns = matrix.columns(),
                    components_found,
                    "vote matrix is rank-deficient, padding embedding with zeros"
                );
            }
        }
    }

    Ok(Projection {
        coordinates,
        explained_variance_ratio: ratios,
        components_found,
    })
}

/// Power iteration for the dominant axis orthogonal to `found`.
///
/// Returns `None` when nothing is left outside the span of `found`.
fn principal_axis(
    centered: &[Vec<f64>],
    found: &[Vec<f64>],
    rng: &mut StdRng,
    options: &PcaOptions,
) -> Option<Vec<f64>> {
    let width = centered.first()?.len();
    let mut v: Vec<f64> = (0..width).map(|_| rng.random_range(-1.0..1.0)).collect();
    orthogonalize(&mut v, found);
    if !normalize(&mut v) {
        return None;
    }

    for _ in 0..options.max_iterations.max(1) {
        let scores = project(centered, &v);
        let mut next = vec![0.0; width];
        for (row, score) in centered.iter().zip(&scores) {
            for (n, x) in next.iter_mut().zip(row) {
                *n += x * score;
            }
        }
        orthogonalize(&mut next, found);
        if !normalize(&mut next) {
            return None;
        }

        let shift: f64 = next
            .iter()
            .zip(&v)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt();
        v = next;
        if shift < options.tolerance {
            break;
        }
    }

    Some(v)
}

fn project(centered: &[Vec<f64>], axis: &[f64]) -> Vec<f64> {
    centered
        .iter()
        .map(|row| row.iter().zip(axis).map(|(x, a)| x * a).sum())
        .collect()
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let dot: f64 = v.iter().zip(b).map(|(x, y)| x * y).sum();
        for (x, y) in v.iter_mut().zip(b) {
            *x -= dot * y;
        }
    }
}

/// Scale to unit length. Returns false for a (near) zero vector.
fn normalize(v: &mut [f64]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm <= VARIANCE_EPSILON {
        return false;
    }
    v.iter_mut().for_each(|x| *x /= norm);
    true
}

fn largest_magnitude(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BillId, LegislatorId};

    fn matrix(rows: Vec<Vec<f64>>) -> VoteMatrix {
        let ids = (0..rows.len())
            .map(|i| LegislatorId::new(format!("L{i}")))
            .collect();
        let bills = (0..rows.first().map_or(0, Vec::len))
            .map(|i| BillId::new(format!("B{i}")))
            .collect();
        VoteMatrix::from_dense(ids, bills, rows)
    }

    #[test]
    fn test_projection_preserves_row_count() {
        let m = matrix(vec![
            vec![1.0, -1.0, 1.0],
            vec![1.0, 1.0, 0.0],
            vec![-1.0, -1.0, 1.0],
            vec![0.0, 1.0, -1.0],
        ]);
        let p = project_2d(&m, &PcaOptions::default()).unwrap();
        assert_eq!(p.coordinates.len(), 4);
        assert_eq!(p.components_found, 2);
        assert!(!p.is_degenerate());
    }

    #[test]
    fn test_first_axis_carries_most_variance() {
        let m = matrix(vec![
            vec![1.0, -1.0],
            vec![1.0, 1.0],
            vec![-1.0, -1.0],
        ]);
        let p = project_2d(&m, &PcaOptions::default()).unwrap();
        let [first, second] = p.explained_variance_ratio;
        assert!(first >= second);
        assert!((first + second - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_is_reproducible() {
        let m = matrix(vec![
            vec![1.0, -1.0],
            vec![1.0, 1.0],
            vec![-1.0, -1.0],
        ]);
        let a = project_2d(&m, &PcaOptions::default()).unwrap();
        let b = project_2d(&m, &PcaOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_scores_are_centered() {
        let m = matrix(vec![
            vec![1.0, 0.0, -1.0],
            vec![1.0, 1.0, 1.0],
            vec![-1.0, -1.0, 0.0],
            vec![0.0, 1.0, -1.0],
        ]);
        let p = project_2d(&m, &PcaOptions::default()).unwrap();
        for c in 0..EMBEDDING_COMPONENTS {
            let sum: f64 = p.coordinates.iter().map(|xy| xy[c]).sum();
            assert!(sum.abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_informative_column_is_zero_padded() {
        let m = matrix(vec![vec![1.0, 1.0], vec![-1.0, 1.0], vec![1.0, 1.0]]);
        let p = project_2d(&m, &PcaOptions::default()).unwrap();

        assert_eq!(p.components_found, 1);
        assert!(p.is_degenerate());
        assert!(p.coordinates.iter().all(|xy| xy[1] == 0.0));
        assert!(p.coordinates.iter().any(|xy| xy[0] != 0.0));
    }

    #[test]
    fn test_single_legislator_fails_under_fail_policy() {
        let m = matrix(vec![vec![1.0, -1.0]]);
        let options = PcaOptions {
            on_degenerate: DegeneratePolicy::Fail,
            ..PcaOptions::default()
        };
        assert_eq!(
            project_2d(&m, &options),
            Err(AnalysisError::DegenerateMatrix {
                rows: 1,
                columns: 2,
                supported: 0,
                required: 2,
            })
        );

        let padded = project_2d(&m, &PcaOptions::default()).unwrap();
        assert_eq!(padded.coordinates, vec![[0.0, 0.0]]);
    }

    #[test]
    fn test_empty_matrix_is_an_error() {
        assert_eq!(
            project_2d(&VoteMatrix::empty(), &PcaOptions::default()),
            Err(AnalysisError::EmptyMatrix)
        );
    }

    #[test]
    fn test_largest_score_is_positive() {
        let m = matrix(vec![
            vec![1.0, 1.0, 1.0],
            vec![1.0, 1.0, 0.0],
            vec![-1.0, -1.0, -1.0],
            vec![-1.0, 0.0, -1.0],
        ]);
        let p = project_2d(&m, &PcaOptions::default()).unwrap();
        for c in 0..p.components_found {
            let pivot = largest_magnitude(
                &p.coordinates.iter().map(|xy| xy[c]).collect::<Vec<_>>(),
            )
            .unwrap();
            assert!(pivot > 0.0);
        }
    }
}
