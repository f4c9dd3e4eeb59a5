//! Clustering strategies
//!
//! Every strategy turns a batch of equal-length vectors into one label per
//! vector, in input order. The pipeline runs each configured strategy over
//! the same vectors and writes a separate report for each.

mod density;
mod hierarchical;

pub use density::DensityClusterer;
pub use hierarchical::HierarchicalClusterer;

use std::fmt;
use thiserror::Error;

/// Group assignment of one vector
///
/// `Noise` sorts before every cluster so reports list it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClusterLabel {
    Noise,
    Cluster(usize),
}

impl ClusterLabel {
    pub fn is_noise(&self) -> bool {
        matches!(self, Self::Noise)
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noise => write!(f, "-1"),
            Self::Cluster(id) => write!(f, "{}", id),
        }
    }
}

/// Errors raised by clustering strategies
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("vector {index} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("vector {index} contains a non-finite value")]
    NonFinite { index: usize },
}

/// A clustering strategy
pub trait Clusterer: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Assigns a label to every vector, in input order
    fn cluster(&self, vectors: &[Vec<f32>]) -> Result<Vec<ClusterLabel>, ClusterError>;
}

/// Checks that all vectors share one dimension and hold finite values
pub(crate) fn check_vectors(vectors: &[Vec<f32>]) -> Result<(), ClusterError> {
    let Some(first) = vectors.first() else {
        return Ok(());
    };
    let expected = first.len();
    for (index, vector) in vectors.iter().enumerate() {
        if vector.len() != expected {
            return Err(ClusterError::DimensionMismatch {
                index,
                expected,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(ClusterError::NonFinite { index });
        }
    }
    Ok(())
}

/// Euclidean distance
pub(crate) fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Full pairwise distance matrix
pub(crate) fn distance_matrix(vectors: &[Vec<f32>]) -> Vec<Vec<f64>> {
    let n = vectors.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&vectors[i], &vectors[j]);
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }
    matrix
}
