//! Agglomerative clustering with Ward linkage
//!
//! Starts from singleton clusters and repeatedly merges the closest pair
//! while their Ward distance stays below the threshold. Distances between a
//! merged cluster and the rest follow the Lance-Williams update, so no
//! centroid is ever recomputed.

use super::{check_vectors, distance_matrix, ClusterError, ClusterLabel, Clusterer};

/// Ward-linkage agglomerative clusterer
#[derive(Debug, Clone)]
pub struct HierarchicalClusterer {
    distance_threshold: f64,
}

impl HierarchicalClusterer {
    pub fn new(distance_threshold: f64) -> Self {
        Self { distance_threshold }
    }

    pub fn distance_threshold(&self) -> f64 {
        self.distance_threshold
    }
}

impl Clusterer for HierarchicalClusterer {
    fn name(&self) -> &str {
        "hierarchical"
    }

    fn cluster(&self, vectors: &[Vec<f32>]) -> Result<Vec<ClusterLabel>, ClusterError> {
        check_vectors(vectors)?;
        let n = vectors.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut distances = distance_matrix(vectors);
        let mut size = vec![1usize; n];
        let mut active = vec![true; n];
        // Representative cluster of each point
        let mut assignment: Vec<usize> = (0..n).collect();

        loop {
            let Some((i, j, d)) = closest_pair(&distances, &active) else {
                break;
            };
            if d >= self.distance_threshold {
                break;
            }

            for k in 0..n {
                if !active[k] || k == i || k == j {
                    continue;
                }
                let updated = ward_update(
                    distances[i][k],
                    distances[j][k],
                    d,
                    size[i] as f64,
                    size[j] as f64,
                    size[k] as f64,
                );
                distances[i][k] = updated;
                distances[k][i] = updated;
            }
            size[i] += size[j];
            active[j] = false;
            for cluster in assignment.iter_mut() {
                if *cluster == j {
                    *cluster = i;
                }
            }
        }

        Ok(number_by_first_appearance(&assignment))
    }
}

/// Closest pair of active clusters, `i < j`
fn closest_pair(distances: &[Vec<f64>], active: &[bool]) -> Option<(usize, usize, f64)> {
    let n = distances.len();
    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..n {
        if !active[i] {
            continue;
        }
        for j in (i + 1)..n {
            if !active[j] {
                continue;
            }
            let d = distances[i][j];
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((i, j, d));
            }
        }
    }
    best
}

/// Ward distance from `i ∪ j` to `k`
fn ward_update(d_ik: f64, d_jk: f64, d_ij: f64, n_i: f64, n_j: f64, n_k: f64) -> f64 {
    let total = n_i + n_j + n_k;
    let squared =
        ((n_i + n_k) * d_ik * d_ik + (n_j + n_k) * d_jk * d_jk - n_k * d_ij * d_ij) / total;
    squared.max(0.0).sqrt()
}

fn number_by_first_appearance(assignment: &[usize]) -> Vec<ClusterLabel> {
    let mut numbering = vec![None; assignment.len()];
    let mut next = 0;
    assignment
        .iter()
        .map(|&cluster| {
            let id = *numbering[cluster].get_or_insert_with(|| {
                let id = next;
                next += 1;
                id
            });
            ClusterLabel::Cluster(id)
        })
        .collect()
}
