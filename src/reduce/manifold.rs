// Fuzzy topological representation of the input data.
//
// Each point gets a local metric from its kNN distances (rho = distance to
// the nearest distinct neighbour, sigma = scale that makes the neighbour
// memberships sum to log2(k)). Directed memberships are then combined with a
// fuzzy union into one symmetric weighted graph.

use std::collections::BTreeMap;

use ndarray::Array1;

use super::knn::KnnGraph;

const SMOOTH_K_TOLERANCE: f32 = 1e-5;
const MIN_K_DIST_SCALE: f32 = 1e-3;
const SMOOTH_K_ITERATIONS: usize = 64;

/// Symmetric sparse graph in coordinate form, sorted by (row, col).
#[derive(Debug, Clone, Default)]
pub struct SparseGraph {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub weights: Vec<f32>,
}

impl SparseGraph {
    pub fn n_edges(&self) -> usize {
        self.weights.len()
    }

    pub fn max_weight(&self) -> f32 {
        self.weights.iter().copied().fold(0.0, f32::max)
    }
}

/// A learned manifold: the fuzzy graph plus the local geometry behind it.
#[derive(Debug, Clone)]
pub struct LearnedManifold {
    /// graph[i, j] is the membership strength of the edge between i and j
    pub graph: SparseGraph,
    /// Per-point normalization factor
    pub sigmas: Array1<f32>,
    /// Per-point distance to the nearest distinct neighbour
    pub rhos: Array1<f32>,
    pub n_vertices: usize,
}

/// Compute sigma and rho for every point by binary search.
pub fn smooth_knn_dist(knn: &KnnGraph, local_connectivity: f32) -> (Array1<f32>, Array1<f32>) {
    let n = knn.distances.nrows();
    let k = knn.n_neighbors();
    let target = (k as f32).log2();
    let mean_all = knn.distances.mean().unwrap_or(0.0);

    let mut sigmas = Array1::<f32>::zeros(n);
    let mut rhos = Array1::<f32>::zeros(n);

    for i in 0..n {
        let row = knn.distances.row(i);
        let non_zero: Vec<f32> = row.iter().copied().filter(|&d| d > 0.0).collect();

        let rho = if non_zero.len() as f32 >= local_connectivity {
            let index = local_connectivity.floor() as usize;
            let interpolation = local_connectivity - index as f32;
            if index > 0 {
                let mut rho = non_zero[index - 1];
                if interpolation > SMOOTH_K_TOLERANCE && index < non_zero.len() {
                    rho += interpolation * (non_zero[index] - non_zero[index - 1]);
                }
                rho
            } else {
                interpolation * non_zero[0]
            }
        } else {
            non_zero.iter().copied().fold(0.0, f32::max)
        };

        let mut lo = 0.0_f32;
        let mut hi = f32::INFINITY;
        let mut mid = 1.0_f32;

        for _ in 0..SMOOTH_K_ITERATIONS {
            let psum: f32 = row
                .iter()
                .skip(1)
                .map(|&d| {
                    let d = d - rho;
                    if d > 0.0 {
                        (-d / mid).exp()
                    } else {
                        1.0
                    }
                })
                .sum();

            if (psum - target).abs() < SMOOTH_K_TOLERANCE {
                break;
            }
            if psum > target {
                hi = mid;
                mid = (lo + hi) / 2.0;
            } else {
                lo = mid;
                if hi.is_infinite() {
                    mid *= 2.0;
                } else {
                    mid = (lo + hi) / 2.0;
                }
            }
        }

        let floor = if rho > 0.0 {
            MIN_K_DIST_SCALE * row.mean().unwrap_or(0.0)
        } else {
            MIN_K_DIST_SCALE * mean_all
        };

        sigmas[i] = mid.max(floor);
        rhos[i] = rho;
    }

    (sigmas, rhos)
}

/// Build the symmetric fuzzy simplicial set from a kNN table.
pub fn fuzzy_simplicial_set(knn: &KnnGraph, local_connectivity: f32) -> LearnedManifold {
    let n = knn.indices.nrows();
    let (sigmas, rhos) = smooth_knn_dist(knn, local_connectivity);

    let mut directed: BTreeMap<(usize, usize), f32> = BTreeMap::new();
    for i in 0..n {
        for slot in 0..knn.n_neighbors() {
            let j = knn.indices[[i, slot]];
            if j == i {
                continue;
            }
            let d = knn.distances[[i, slot]] - rhos[i];
            let strength = if d <= 0.0 || sigmas[i] == 0.0 {
                1.0
            } else {
                (-d / sigmas[i]).exp()
            };
            directed.insert((i, j), strength);
        }
    }

    // Fuzzy union: w(i,j) = a + b - a*b with a = w(i->j), b = w(j->i)
    let mut union: BTreeMap<(usize, usize), f32> = BTreeMap::new();
    for (&(i, j), &a) in &directed {
        let b = directed.get(&(j, i)).copied().unwrap_or(0.0);
        let w = a + b - a * b;
        union.insert((i, j), w);
        union.insert((j, i), w);
    }

    let mut graph = SparseGraph::default();
    for ((i, j), w) in union {
        if w > 0.0 {
            graph.rows.push(i);
            graph.cols.push(j);
            graph.weights.push(w);
        }
    }

    LearnedManifold {
        graph,
        sigmas,
        rhos,
        n_vertices: n,
    }
}
