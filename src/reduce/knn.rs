// Exact k-nearest neighbours.
//
// Corpora here are short title lists, so a brute-force scan is simpler than
// building an approximate index. Each row costs n distances plus an O(n)
// selection of the k nearest; the whole table is O(n² · dim), which stays
// practical up to roughly ten thousand titles. Every point is its own 0-th
// neighbour at distance 0.

use ndarray::{Array2, ArrayView1};

use super::Metric;

/// k-nearest-neighbour table: row i lists i's neighbours, nearest first.
#[derive(Debug, Clone)]
pub struct KnnGraph {
    pub indices: Array2<usize>,
    pub distances: Array2<f32>,
}

impl KnnGraph {
    pub fn n_neighbors(&self) -> usize {
        self.indices.ncols()
    }
}

/// Distance between two rows under `metric`.
pub fn distance(metric: Metric, a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    match metric {
        Metric::Euclidean => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
        Metric::Cosine => {
            let dot = a.dot(&b);
            let norm_a = a.dot(&a).sqrt();
            let norm_b = b.dot(&b).sqrt();
            if norm_a <= f32::EPSILON && norm_b <= f32::EPSILON {
                0.0
            } else if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
                1.0
            } else {
                (1.0 - dot / (norm_a * norm_b)).max(0.0)
            }
        }
    }
}

/// Brute-force kNN. `k` counts the point itself, so `k == 1` yields only
/// self-neighbours.
pub fn exact_knn(data: &Array2<f32>, k: usize, metric: Metric) -> KnnGraph {
    let n = data.nrows();
    let mut indices = Array2::<usize>::zeros((n, k));
    let mut distances = Array2::<f32>::zeros((n, k));

    for i in 0..n {
        let mut row: Vec<(f32, usize)> = (0..n)
            .map(|j| {
                let d = if i == j {
                    0.0
                } else {
                    distance(metric, data.row(i), data.row(j))
                };
                (d, j)
            })
            .collect();
        // Self first even when duplicates also sit at distance 0
        let nearest_first = |a: &(f32, usize), b: &(f32, usize)| {
            a.0.total_cmp(&b.0)
                .then_with(|| (a.1 != i).cmp(&(b.1 != i)))
                .then_with(|| a.1.cmp(&b.1))
        };
        if k > 0 && k < n {
            row.select_nth_unstable_by(k - 1, nearest_first);
        }
        row.truncate(k);
        row.sort_by(nearest_first);

        for (slot, &(d, j)) in row.iter().enumerate() {
            indices[[i, slot]] = j;
            distances[[i, slot]] = d;
        }
    }

    KnnGraph { indices, distances }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_self_is_first_neighbour() {
        let data = array![[0.0, 0.0], [1.0, 0.0], [5.0, 0.0]];
        let knn = exact_knn(&data, 2, Metric::Euclidean);
        for i in 0..3 {
            assert_eq!(knn.indices[[i, 0]], i);
            assert_eq!(knn.distances[[i, 0]], 0.0);
        }
        assert_eq!(knn.indices[[0, 1]], 1);
        assert_eq!(knn.indices[[2, 1]], 1);
    }

    #[test]
    fn test_self_first_with_duplicates() {
        let data = array![[1.0, 1.0], [1.0, 1.0]];
        let knn = exact_knn(&data, 2, Metric::Euclidean);
        assert_eq!(knn.indices[[1, 0]], 1);
        assert_eq!(knn.indices[[1, 1]], 0);
    }

    #[test]
    fn test_partial_selection_matches_full_ranking() {
        let values: Vec<f32> = (0..40)
            .map(|i| ((i * 37 % 23) as f32, (i * 11 % 17) as f32))
            .flat_map(|(x, y)| [x, y])
            .collect();
        let data = Array2::from_shape_vec((40, 2), values).unwrap();
        let knn = exact_knn(&data, 5, Metric::Euclidean);
        for i in 0..40 {
            let mut all: Vec<(f32, usize)> = (0..40)
                .map(|j| (distance(Metric::Euclidean, data.row(i), data.row(j)), j))
                .collect();
            all.sort_by(|a, b| {
                a.0.total_cmp(&b.0)
                    .then_with(|| (a.1 != i).cmp(&(b.1 != i)))
                    .then_with(|| a.1.cmp(&b.1))
            });
            let expected: Vec<usize> = all.iter().take(5).map(|&(_, j)| j).collect();
            assert_eq!(knn.indices.row(i).to_vec(), expected);
            for slot in 1..5 {
                assert!(knn.distances[[i, slot - 1]] <= knn.distances[[i, slot]]);
            }
        }
    }

    #[test]
    fn test_cosine_ignores_magnitude() {
        let data = array![[1.0, 0.0], [3.0, 0.0], [0.0, 1.0]];
        let d_same = distance(Metric::Cosine, data.row(0), data.row(1));
        let d_orth = distance(Metric::Cosine, data.row(0), data.row(2));
        assert!(d_same.abs() < 1e-6);
        assert!((d_orth - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let data = array![[0.0, 0.0], [1.0, 0.0]];
        assert_eq!(distance(Metric::Cosine, data.row(0), data.row(1)), 1.0);
        assert_eq!(distance(Metric::Cosine, data.row(0), data.row(0)), 0.0);
    }
}
