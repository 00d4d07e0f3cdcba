// Low-dimensional layout of a learned manifold.
//
// Points start at seeded random positions and are moved by stochastic
// gradient descent: every graph edge attracts its endpoints in proportion to
// its weight, and a few randomly drawn non-neighbours repel. The attraction
// curve 1 / (1 + a·d^(2b)) is fitted once from min_dist and spread.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::manifold::SparseGraph;

/// Gradient magnitude cap per coordinate.
const GRADIENT_CLIP: f32 = 4.0;

/// Parameters of a single SGD layout run.
#[derive(Debug, Clone)]
pub struct LayoutParams {
    pub n_components: usize,
    pub n_epochs: usize,
    pub a: f32,
    pub b: f32,
    pub initial_alpha: f32,
    pub repulsion_strength: f32,
    pub negative_sample_rate: usize,
    pub seed: u64,
}

/// Default number of epochs for a corpus of `n` points.
pub fn default_epochs(n: usize) -> usize {
    if n <= 10_000 {
        500
    } else {
        200
    }
}

/// Fit (a, b) so that 1 / (1 + a·x^(2b)) approximates the target curve:
/// 1 below `min_dist`, exp(-(x - min_dist) / spread) above it.
pub fn find_ab_params(spread: f32, min_dist: f32) -> (f32, f32) {
    let xs: Vec<f64> = (0..300)
        .map(|i| 3.0 * spread as f64 * i as f64 / 299.0)
        .collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| {
            if x < min_dist as f64 {
                1.0
            } else {
                (-(x - min_dist as f64) / spread as f64).exp()
            }
        })
        .collect();

    let sse = |a: f64, b: f64| -> f64 {
        xs.iter()
            .zip(&ys)
            .map(|(&x, &y)| {
                let fit = 1.0 / (1.0 + a * x.powf(2.0 * b));
                (fit - y) * (fit - y)
            })
            .sum()
    };

    // Coarse grid, then pattern search around the best cell
    let mut best = (1.0, 1.0);
    let mut best_err = f64::INFINITY;
    for ai in 1..=100 {
        for bi in 1..=100 {
            let (a, b) = (ai as f64 * 0.05, bi as f64 * 0.02);
            let err = sse(a, b);
            if err < best_err {
                best_err = err;
                best = (a, b);
            }
        }
    }

    let mut step = (0.025, 0.01);
    while step.0 > 1e-6 {
        let mut improved = false;
        for (da, db) in [(step.0, 0.0), (-step.0, 0.0), (0.0, step.1), (0.0, -step.1)] {
            let candidate = (best.0 + da, best.1 + db);
            if candidate.0 <= 0.0 || candidate.1 <= 0.0 {
                continue;
            }
            let err = sse(candidate.0, candidate.1);
            if err < best_err {
                best_err = err;
                best = candidate;
                improved = true;
            }
        }
        if !improved {
            step = (step.0 / 2.0, step.1 / 2.0);
        }
    }

    (best.0 as f32, best.1 as f32)
}

/// Seeded uniform initialization, rescaled per axis into [0, 10].
pub fn random_init(n: usize, n_components: usize, rng: &mut StdRng) -> Array2<f32> {
    let mut embedding = Array2::<f32>::zeros((n, n_components));
    for v in embedding.iter_mut() {
        *v = rng.random_range(-10.0..10.0);
    }
    rescale_axes(&mut embedding);
    embedding
}

fn rescale_axes(embedding: &mut Array2<f32>) {
    for mut column in embedding.columns_mut() {
        let min = column.iter().copied().fold(f32::INFINITY, f32::min);
        let max = column.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let range = max - min;
        if range > f32::EPSILON {
            column.mapv_inplace(|v| 10.0 * (v - min) / range);
        }
    }
}

fn clip(v: f32) -> f32 {
    v.clamp(-GRADIENT_CLIP, GRADIENT_CLIP)
}

fn squared_distance(embedding: &Array2<f32>, i: usize, j: usize) -> f32 {
    embedding
        .row(i)
        .iter()
        .zip(embedding.row(j).iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

/// Per-edge sampling period: strong edges are sampled every epoch, weak
/// ones proportionally less often. Non-positive weights are never sampled.
fn epochs_per_sample(weights: &[f32], n_epochs: usize) -> Vec<f32> {
    let max = weights.iter().copied().fold(0.0, f32::max);
    weights
        .iter()
        .map(|&w| {
            let n_samples = n_epochs as f32 * (w / max);
            if n_samples > 0.0 {
                n_epochs as f32 / n_samples
            } else {
                -1.0
            }
        })
        .collect()
}

/// Optimize the layout of `graph` and return one row per vertex.
pub fn optimize_layout(graph: &SparseGraph, n_vertices: usize, params: &LayoutParams) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut embedding = random_init(n_vertices, params.n_components, &mut rng);

    if graph.n_edges() == 0 || params.n_epochs == 0 {
        return embedding;
    }

    // Edges too weak to be sampled even once over the run are dropped.
    let cutoff = graph.max_weight() / params.n_epochs as f32;
    let edges: Vec<(usize, usize, f32)> = graph
        .rows
        .iter()
        .zip(&graph.cols)
        .zip(&graph.weights)
        .filter(|(_, &w)| w >= cutoff)
        .map(|((&i, &j), &w)| (i, j, w))
        .collect();
    let weights: Vec<f32> = edges.iter().map(|e| e.2).collect();

    let eps = epochs_per_sample(&weights, params.n_epochs);
    let nsr = params.negative_sample_rate.max(1) as f32;
    let eps_negative: Vec<f32> = eps.iter().map(|e| e / nsr).collect();
    let mut next_sample = eps.clone();
    let mut next_negative = eps_negative.clone();

    let (a, b) = (params.a, params.b);
    let gamma = params.repulsion_strength;
    let dims = params.n_components;
    let mut alpha = params.initial_alpha;

    for epoch in 0..params.n_epochs {
        let n = epoch as f32;
        for (e, &(head, tail, _)) in edges.iter().enumerate() {
            if eps[e] <= 0.0 || next_sample[e] > n {
                continue;
            }

            let dist_sq = squared_distance(&embedding, head, tail);
            let coeff = if dist_sq > 0.0 {
                -2.0 * a * b * dist_sq.powf(b - 1.0) / (a * dist_sq.powf(b) + 1.0)
            } else {
                0.0
            };
            for d in 0..dims {
                let grad = clip(coeff * (embedding[[head, d]] - embedding[[tail, d]]));
                embedding[[head, d]] += grad * alpha;
                embedding[[tail, d]] -= grad * alpha;
            }
            next_sample[e] += eps[e];

            let n_negative = ((n - next_negative[e]) / eps_negative[e]).max(0.0) as usize;
            for _ in 0..n_negative {
                let other = rng.random_range(0..n_vertices);
                if other == head {
                    continue;
                }
                let dist_sq = squared_distance(&embedding, head, other);
                if dist_sq <= 0.0 {
                    continue;
                }
                let coeff =
                    2.0 * gamma * b / ((0.001 + dist_sq) * (a * dist_sq.powf(b) + 1.0));
                for d in 0..dims {
                    let grad = clip(coeff * (embedding[[head, d]] - embedding[[other, d]]));
                    embedding[[head, d]] += grad * alpha;
                }
            }
            next_negative[e] += n_negative as f32 * eps_negative[e];
        }
        alpha = params.initial_alpha * (1.0 - (epoch + 1) as f32 / params.n_epochs as f32);
    }

    embedding
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ab_params_for_standard_min_dist() {
        // Reference curve values for spread=1.0, min_dist=0.1
        let (a, b) = find_ab_params(1.0, 0.1);
        assert!((a - 1.577).abs() < 0.05, "a = {a}");
        assert!((b - 0.895).abs() < 0.03, "b = {b}");
    }

    #[test]
    fn test_ab_params_for_zero_min_dist() {
        let (a, b) = find_ab_params(1.0, 0.0);
        assert!((a - 1.929).abs() < 0.08, "a = {a}");
        assert!((b - 0.7915).abs() < 0.03, "b = {b}");
    }

    #[test]
    fn test_random_init_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let init = random_init(50, 2, &mut rng);
        assert!(init.iter().all(|&v| (0.0..=10.0).contains(&v)));
    }

    #[test]
    fn test_epochs_per_sample_strongest_edge_every_epoch() {
        let eps = epochs_per_sample(&[1.0, 0.5, 0.0], 100);
        assert!((eps[0] - 1.0).abs() < 1e-6);
        assert!((eps[1] - 2.0).abs() < 1e-6);
        assert_eq!(eps[2], -1.0);
    }

    #[test]
    fn test_default_epochs() {
        assert_eq!(default_epochs(40), 500);
        assert_eq!(default_epochs(20_000), 200);
    }
}
