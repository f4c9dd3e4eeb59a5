//! Density-based clustering (HDBSCAN)
//!
//! Steps:
//! 1. Core distance of each point from its `min_samples` neighbourhood
//! 2. Minimum spanning tree over mutual reachability distances
//! 3. Single-linkage tree from the sorted tree edges
//! 4. Condensed tree, dropping splits smaller than `min_cluster_size`
//! 5. Excess-of-mass selection of the most stable clusters
//!
//! Points outside every selected cluster are noise.

use super::{check_vectors, distance_matrix, ClusterError, ClusterLabel, Clusterer};
use std::collections::VecDeque;

/// Distances below this are treated as this when turned into lambda values
const MIN_DISTANCE: f64 = 1e-10;

/// HDBSCAN clusterer
#[derive(Debug, Clone)]
pub struct DensityClusterer {
    min_cluster_size: usize,
    min_samples: usize,
}

impl DensityClusterer {
    /// Creates a clusterer
    ///
    /// `min_cluster_size` is raised to 2 and `min_samples` to 1 if smaller.
    pub fn new(min_cluster_size: usize, min_samples: usize) -> Self {
        Self {
            min_cluster_size: min_cluster_size.max(2),
            min_samples: min_samples.max(1),
        }
    }

    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }
}

impl Clusterer for DensityClusterer {
    fn name(&self) -> &str {
        "hdbscan"
    }

    fn cluster(&self, vectors: &[Vec<f32>]) -> Result<Vec<ClusterLabel>, ClusterError> {
        check_vectors(vectors)?;
        let n = vectors.len();
        if n < self.min_cluster_size || n < 2 {
            return Ok(vec![ClusterLabel::Noise; n]);
        }

        let distances = distance_matrix(vectors);
        let core = core_distances(&distances, self.min_samples);
        let mut edges = minimum_spanning_tree(&distances, &core);
        edges.sort_by(|a, b| a.2.total_cmp(&b.2));
        let tree = SingleLinkage::build(n, &edges);
        let condensed = CondensedTree::build(&tree, self.min_cluster_size);
        let selected = condensed.select_clusters();

        Ok(condensed.label_points(&selected))
    }
}

/// Distance to the `min_samples`-th nearest point, counting the point itself
fn core_distances(distances: &[Vec<f64>], min_samples: usize) -> Vec<f64> {
    distances
        .iter()
        .map(|row| {
            let mut sorted = row.clone();
            sorted.sort_by(f64::total_cmp);
            let k = (min_samples - 1).min(sorted.len() - 1);
            sorted[k]
        })
        .collect()
}

/// Prim's algorithm over the dense mutual reachability graph
fn minimum_spanning_tree(distances: &[Vec<f64>], core: &[f64]) -> Vec<(usize, usize, f64)> {
    let n = distances.len();
    let reach = |i: usize, j: usize| distances[i][j].max(core[i]).max(core[j]);

    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    let mut current = 0;
    in_tree[0] = true;
    for _ in 1..n {
        let mut next = None;
        let mut next_weight = f64::INFINITY;
        for j in 0..n {
            if in_tree[j] {
                continue;
            }
            let d = reach(current, j);
            if d < best[j] {
                best[j] = d;
                from[j] = current;
            }
            if next.is_none() || best[j] < next_weight {
                next = Some(j);
                next_weight = best[j];
            }
        }
        let Some(j) = next else {
            break;
        };
        in_tree[j] = true;
        edges.push((from[j], j, next_weight));
        current = j;
    }
    edges
}

/// Binary merge tree over `2n - 1` nodes; nodes below `n` are points
struct SingleLinkage {
    points: usize,
    children: Vec<Option<(usize, usize)>>,
    distance: Vec<f64>,
    size: Vec<usize>,
}

impl SingleLinkage {
    fn build(points: usize, sorted_edges: &[(usize, usize, f64)]) -> Self {
        let nodes = 2 * points - 1;
        let mut parent: Vec<usize> = (0..nodes).collect();
        let mut children = vec![None; nodes];
        let mut distance = vec![0.0; nodes];
        let mut size = vec![1; nodes];

        for (k, &(a, b, weight)) in sorted_edges.iter().enumerate() {
            let ra = find(&mut parent, a);
            let rb = find(&mut parent, b);
            let node = points + k;
            children[node] = Some((ra, rb));
            distance[node] = weight;
            size[node] = size[ra] + size[rb];
            parent[ra] = node;
            parent[rb] = node;
        }

        Self {
            points,
            children,
            distance,
            size,
        }
    }

    fn root(&self) -> usize {
        2 * self.points - 2
    }

    /// Points under a node
    fn leaves(&self, node: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(x) = stack.pop() {
            match self.children[x] {
                Some((l, r)) => {
                    stack.push(l);
                    stack.push(r);
                }
                None => leaves.push(x),
            }
        }
        leaves
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    let mut root = x;
    while parent[root] != root {
        root = parent[root];
    }
    while parent[x] != root {
        let next = parent[x];
        parent[x] = root;
        x = next;
    }
    root
}

/// Cluster hierarchy after removing splits smaller than the minimum size
///
/// Cluster 0 is the root; children always have larger ids than parents.
struct CondensedTree {
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    birth: Vec<f64>,
    stability: Vec<f64>,
    /// Cluster each point fell out of
    point_cluster: Vec<usize>,
}

impl CondensedTree {
    fn build(tree: &SingleLinkage, min_cluster_size: usize) -> Self {
        let mut condensed = Self {
            parent: vec![None],
            children: vec![Vec::new()],
            birth: vec![0.0],
            stability: vec![0.0],
            point_cluster: vec![0; tree.points],
        };

        let mut queue = VecDeque::from([(tree.root(), 0usize)]);
        while let Some((node, cluster)) = queue.pop_front() {
            let Some((left, right)) = tree.children[node] else {
                condensed.point_cluster[node] = cluster;
                continue;
            };
            let lambda = 1.0 / tree.distance[node].max(MIN_DISTANCE);
            let persistence = lambda - condensed.birth[cluster];
            let left_big = tree.size[left] >= min_cluster_size;
            let right_big = tree.size[right] >= min_cluster_size;

            match (left_big, right_big) {
                (true, true) => {
                    condensed.stability[cluster] +=
                        persistence * (tree.size[left] + tree.size[right]) as f64;
                    for child in [left, right] {
                        let id = condensed.add_cluster(cluster, lambda);
                        queue.push_back((child, id));
                    }
                }
                (true, false) | (false, true) => {
                    let (keep, drop) = if left_big { (left, right) } else { (right, left) };
                    condensed.stability[cluster] += persistence * tree.size[drop] as f64;
                    for point in tree.leaves(drop) {
                        condensed.point_cluster[point] = cluster;
                    }
                    queue.push_back((keep, cluster));
                }
                (false, false) => {
                    condensed.stability[cluster] +=
                        persistence * (tree.size[left] + tree.size[right]) as f64;
                    for point in tree.leaves(node) {
                        condensed.point_cluster[point] = cluster;
                    }
                }
            }
        }
        condensed
    }

    fn add_cluster(&mut self, parent: usize, birth: f64) -> usize {
        let id = self.parent.len();
        self.parent.push(Some(parent));
        self.children.push(Vec::new());
        self.birth.push(birth);
        self.stability.push(0.0);
        self.children[parent].push(id);
        id
    }

    /// Excess-of-mass selection; the root is never selected
    fn select_clusters(&self) -> Vec<bool> {
        let count = self.parent.len();
        let mut selected = vec![false; count];
        let mut subtree = vec![0.0; count];

        for cluster in (1..count).rev() {
            let children_total: f64 = self.children[cluster].iter().map(|&c| subtree[c]).sum();
            if self.children[cluster].is_empty() || self.stability[cluster] >= children_total {
                selected[cluster] = true;
                subtree[cluster] = self.stability[cluster];
                self.deselect_descendants(cluster, &mut selected);
            } else {
                subtree[cluster] = children_total;
            }
        }
        selected
    }

    fn deselect_descendants(&self, cluster: usize, selected: &mut [bool]) {
        let mut stack = self.children[cluster].clone();
        while let Some(c) = stack.pop() {
            selected[c] = false;
            stack.extend(self.children[c].iter().copied());
        }
    }

    /// Labels points by their nearest selected ancestor cluster
    fn label_points(&self, selected: &[bool]) -> Vec<ClusterLabel> {
        let mut numbering = vec![None; selected.len()];
        let mut next = 0;
        for (cluster, &is_selected) in selected.iter().enumerate() {
            if is_selected {
                numbering[cluster] = Some(next);
                next += 1;
            }
        }

        self.point_cluster
            .iter()
            .map(|&start| {
                let mut cluster = Some(start);
                while let Some(c) = cluster {
                    if let Some(label) = numbering[c] {
                        return ClusterLabel::Cluster(label);
                    }
                    cluster = self.parent[c];
                }
                ClusterLabel::Noise
            })
            .collect()
    }
}
