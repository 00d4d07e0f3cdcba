// Density clustering with HDBSCAN.
//
// Every document gets a cluster label; -1 marks noise (no topic). Cluster
// selection is excess-of-mass, the hdbscan crate's policy.

use std::collections::BTreeMap;

use anyhow::Result;
use hdbscan::{DistanceMetric, Hdbscan, HdbscanHyperParams};
use tracing::info;

/// Label HDBSCAN assigns to points outside every cluster.
pub const NOISE_LABEL: i32 = -1;

/// Minimum cluster size for a corpus: one twentieth of it, never below 2.
pub fn min_cluster_size(corpus_size: usize) -> usize {
    (corpus_size / 20).max(2)
}

/// Knobs handed to HDBSCAN.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterParams {
    pub min_cluster_size: usize,
    pub min_samples: usize,
}

impl ClusterParams {
    pub fn for_corpus(corpus_size: usize) -> Self {
        Self {
            min_cluster_size: min_cluster_size(corpus_size),
            min_samples: 1,
        }
    }
}

/// Trait for assigning a cluster label to every point.
pub trait DocumentClusterer {
    /// One label per point, in input order. `NOISE_LABEL` marks outliers.
    fn fit_predict(&self, points: &[Vec<f32>]) -> Result<Vec<i32>>;
}

/// HDBSCAN over Euclidean distances.
pub struct HdbscanClusterer {
    pub params: ClusterParams,
}

impl HdbscanClusterer {
    pub fn new(params: ClusterParams) -> Self {
        Self { params }
    }
}

impl DocumentClusterer for HdbscanClusterer {
    fn fit_predict(&self, points: &[Vec<f32>]) -> Result<Vec<i32>> {
        if points.is_empty() {
            anyhow::bail!("No points to cluster");
        }
        // The root is never selected, so a cluster only exists once the root
        // splits into two children of min_cluster_size each.
        if points.len() < 2 * self.params.min_cluster_size {
            return Ok(vec![NOISE_LABEL; points.len()]);
        }

        // hdbscan works in f64
        let data: Vec<Vec<f64>> = points
            .iter()
            .map(|p| p.iter().map(|&v| v as f64).collect())
            .collect();

        let hyper_params = HdbscanHyperParams::builder()
            .min_cluster_size(self.params.min_cluster_size)
            .min_samples(self.params.min_samples)
            .dist_metric(DistanceMetric::Euclidean)
            .build();

        let clusterer = Hdbscan::new(&data, hyper_params);
        let labels = clusterer
            .cluster()
            .map_err(|e| anyhow::anyhow!("HDBSCAN failed: {:?}", e))?;

        info!(
            points = labels.len(),
            clusters = count_clusters(&labels),
            noise = labels.iter().filter(|&&l| l == NOISE_LABEL).count(),
            min_cluster_size = self.params.min_cluster_size,
            "Clustered documents"
        );

        Ok(labels)
    }
}

/// Number of distinct non-noise labels.
pub fn count_clusters(labels: &[i32]) -> usize {
    label_counts(labels)
        .keys()
        .filter(|&&l| l != NOISE_LABEL)
        .count()
}

/// Count of points per label, ordered by label.
pub fn label_counts(labels: &[i32]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for &l in labels {
        *counts.entry(l).or_insert(0) += 1;
    }
    counts
}
