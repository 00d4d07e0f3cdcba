// Dimensionality reduction — manifold learning down to two dimensions.
//
// The fitted reduction is computed once and shared: the plots use its
// coordinates and the topic model clusters on the very same projection, so
// nothing is ever refit.

pub mod knn;
pub mod layout;
pub mod manifold;

use anyhow::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use self::knn::exact_knn;
use self::layout::{default_epochs, find_ab_params, optimize_layout, LayoutParams};
use self::manifold::fuzzy_simplicial_set;

/// Upper bound on the neighbourhood size.
pub const MAX_NEIGHBORS: usize = 15;

/// Output dimensionality of every reduction.
pub const REDUCED_DIMS: usize = 2;

/// Seed used for all reductions.
pub const RANDOM_STATE: u64 = 42;

/// Distance used to find neighbours in the input space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Cosine,
    Euclidean,
}

/// Neighbourhood size for a corpus: at most 15, never more than n - 1.
///
/// A single-document corpus yields 0, which `Umap::fit_transform` rejects.
pub fn neighborhood_size(corpus_size: usize) -> usize {
    MAX_NEIGHBORS.min(corpus_size.saturating_sub(1))
}

/// Knobs of the manifold reduction.
#[derive(Debug, Clone)]
pub struct ReducerParams {
    pub n_neighbors: usize,
    pub min_dist: f32,
    pub spread: f32,
    pub metric: Metric,
    pub random_state: u64,
    /// None = 500 epochs for ≤ 10 000 points, 200 above
    pub n_epochs: Option<usize>,
    pub negative_sample_rate: usize,
    pub learning_rate: f32,
    pub local_connectivity: f32,
}

impl ReducerParams {
    /// Parameters used for a corpus of `corpus_size` documents.
    pub fn for_corpus(corpus_size: usize) -> Self {
        Self {
            n_neighbors: neighborhood_size(corpus_size),
            min_dist: 0.0,
            spread: 1.0,
            metric: Metric::Cosine,
            random_state: RANDOM_STATE,
            n_epochs: None,
            negative_sample_rate: 5,
            learning_rate: 1.0,
            local_connectivity: 1.0,
        }
    }
}

/// A fitted reduction: one 2D point per input row.
#[derive(Debug, Clone)]
pub struct FittedReduction {
    pub embedding: Vec<[f32; 2]>,
}

impl FittedReduction {
    pub fn len(&self) -> usize {
        self.embedding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embedding.is_empty()
    }

    /// Coordinates as owned rows, the shape the clusterer consumes.
    pub fn points(&self) -> Vec<Vec<f32>> {
        self.embedding.iter().map(|p| p.to_vec()).collect()
    }
}

/// Contract for dimensionality reduction backends.
pub trait DimensionReducer {
    /// Fit on `data` (one row per document) and project every row to 2D.
    fn fit_transform(&self, data: &[Vec<f32>]) -> Result<FittedReduction>;
}

/// Uniform manifold approximation and projection, single-threaded.
pub struct Umap {
    pub params: ReducerParams,
}

impl Umap {
    pub fn new(params: ReducerParams) -> Self {
        Self { params }
    }
}

impl DimensionReducer for Umap {
    fn fit_transform(&self, data: &[Vec<f32>]) -> Result<FittedReduction> {
        let n = data.len();
        if n < 2 {
            anyhow::bail!("Dimensionality reduction needs at least 2 documents, got {n}");
        }
        let k = self.params.n_neighbors;
        if k == 0 || k > n {
            anyhow::bail!("Invalid neighbourhood size {k} for {n} documents");
        }

        let dim = data[0].len();
        if let Some((i, row)) = data.iter().enumerate().find(|(_, r)| r.len() != dim) {
            anyhow::bail!(
                "Embedding {i} has {} dimensions, expected {dim}",
                row.len()
            );
        }
        if data.iter().flatten().any(|v| !v.is_finite()) {
            anyhow::bail!("Embeddings contain non-finite values");
        }

        let matrix = Array2::from_shape_vec((n, dim), data.iter().flatten().copied().collect())?;

        let knn = exact_knn(&matrix, k, self.params.metric);
        let manifold = fuzzy_simplicial_set(&knn, self.params.local_connectivity);
        let (a, b) = find_ab_params(self.params.spread, self.params.min_dist);

        let layout = LayoutParams {
            n_components: REDUCED_DIMS,
            n_epochs: self.params.n_epochs.unwrap_or_else(|| default_epochs(n)),
            a,
            b,
            initial_alpha: self.params.learning_rate,
            repulsion_strength: 1.0,
            negative_sample_rate: self.params.negative_sample_rate,
            seed: self.params.random_state,
        };
        let coords = optimize_layout(&manifold.graph, manifold.n_vertices, &layout);

        let embedding: Vec<[f32; 2]> = coords
            .rows()
            .into_iter()
            .map(|row| [row[0], row[1]])
            .collect();

        info!(
            documents = n,
            n_neighbors = k,
            edges = manifold.graph.n_edges(),
            epochs = layout.n_epochs,
            "Reduced embeddings to 2D"
        );

        Ok(FittedReduction { embedding })
    }
}
