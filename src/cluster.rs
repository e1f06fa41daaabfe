//! Clustering primitives for cognate detection.
//!
//! Greedy agglomerative clustering over a symmetric distance matrix: start
//! from singletons, repeatedly merge the pair of clusters with the smallest
//! linkage value, stop once that value exceeds the threshold.

use ndarray::Array2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Inter-cluster distance statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    /// Minimum pairwise distance
    Single,
    /// Maximum pairwise distance
    Complete,
    /// Mean pairwise distance (UPGMA)
    Average,
    /// Increase in within-cluster dispersion caused by the merge
    Energy,
}

impl Linkage {
    pub fn distance(self, matrix: &Array2<f64>, a: &[usize], b: &[usize]) -> f64 {
        let cross = a.iter().flat_map(|&i| b.iter().map(move |&j| matrix[[i, j]]));
        match self {
            Linkage::Single => cross.fold(f64::INFINITY, f64::min),
            Linkage::Complete => cross.fold(f64::NEG_INFINITY, f64::max),
            Linkage::Average => mean_distance(matrix, a, b),
            Linkage::Energy => {
                let (size_a, size_b) = (a.len() as f64, b.len() as f64);
                let weight = size_a * size_b / (size_a + size_b);
                weight
                    * (2.0 * mean_distance(matrix, a, b)
                        - mean_distance(matrix, a, a)
                        - mean_distance(matrix, b, b))
            }
        }
    }
}

impl FromStr for Linkage {
    type Err = CoreError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" | "upgma" => Ok(Linkage::Average),
            "energy" => Ok(Linkage::Energy),
            other => Err(CoreError::InvalidParameter(format!("unknown linkage '{}'", other))),
        }
    }
}

fn mean_distance(matrix: &Array2<f64>, a: &[usize], b: &[usize]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .flat_map(|&i| b.iter().map(move |&j| matrix[[i, j]]))
        .sum();
    sum / (a.len() * b.len()) as f64
}

fn validate_matrix(matrix: &Array2<f64>) -> Result<()> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(CoreError::DimensionMismatch(format!(
            "distance matrix must be square, got {}x{}",
            rows, cols
        )));
    }
    for ((i, j), &value) in matrix.indexed_iter() {
        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::InvalidParameter(format!(
                "distance at ({}, {}) must be finite and non-negative, got {}",
                i, j, value
            )));
        }
        if (value - matrix[[j, i]]).abs() > 1e-9 {
            return Err(CoreError::InvalidParameter(format!(
                "distance matrix is not symmetric at ({}, {})",
                i, j
            )));
        }
    }
    Ok(())
}

/// Partition the points of `matrix` into clusters whose merges all stayed
/// within `threshold`. Each cluster lists its point indices in ascending order.
pub fn flat_cluster(
    matrix: &Array2<f64>,
    linkage: Linkage,
    threshold: f64,
) -> Result<Vec<Vec<usize>>> {
    validate_matrix(matrix)?;
    if threshold.is_nan() {
        return Err(CoreError::InvalidParameter("clustering threshold is NaN".to_string()));
    }

    let mut clusters: Vec<Vec<usize>> = (0..matrix.nrows()).map(|i| vec![i]).collect();

    while clusters.len() > 1 {
        let count = clusters.len();
        let best = (0..count)
            .flat_map(|a| (a + 1..count).map(move |b| (a, b)))
            .map(|(a, b)| {
                let value = linkage.distance(matrix, &clusters[a], &clusters[b]);
                (OrderedFloat(value), a, b)
            })
            .min();

        let Some((OrderedFloat(value), a, b)) = best else {
            break;
        };
        if value > threshold {
            break;
        }

        let merged = clusters.remove(b);
        clusters[a].extend(merged);
        clusters[a].sort_unstable();
        tracing::trace!(linkage = ?linkage, value, size = clusters[a].len(), "merged clusters");
    }

    Ok(clusters)
}
