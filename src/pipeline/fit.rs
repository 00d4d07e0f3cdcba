// Model fitting: embed -> reduce -> cluster -> topics.
//
// Every failure here is fatal for the run. The output is the fitted corpus
// the visualization stage draws from: documents, embeddings, the one shared
// 2D reduction and the topic model, all index-aligned.

use anyhow::{Context, Result};
use tracing::info;

use crate::cluster::{ClusterParams, HdbscanClusterer};
use crate::config::ClusterSpace;
use crate::embeddings::traits::DocumentEmbedder;
use crate::reduce::{DimensionReducer, FittedReduction, ReducerParams, Umap};
use crate::topics::{CountVectorizer, TopicModel};

/// Everything the visualization stage needs, aligned by document index.
pub struct FittedCorpus {
    pub docs: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub reduction: FittedReduction,
    pub model: TopicModel,
}

impl FittedCorpus {
    pub fn coordinates(&self) -> &[[f32; 2]] {
        &self.reduction.embedding
    }
}

/// Fit the full topic pipeline over `docs`.
pub fn fit_corpus(
    docs: Vec<String>,
    embedder: &dyn DocumentEmbedder,
    cluster_space: ClusterSpace,
) -> Result<FittedCorpus> {
    let n = docs.len();
    if n < 2 {
        anyhow::bail!("Topic modelling needs at least 2 documents, got {n}");
    }

    println!("\nCreating embeddings...");
    let embeddings = embedder.embed(&docs).context("Failed to embed documents")?;
    if embeddings.len() != n {
        anyhow::bail!("Embedder returned {} vectors for {n} documents", embeddings.len());
    }
    if let Some(bad) = embeddings.iter().find(|e| e.len() != embedder.dimension()) {
        anyhow::bail!(
            "Embedder returned a {}-dimensional vector, expected {}",
            bad.len(),
            embedder.dimension()
        );
    }

    println!("Reducing dimensions...");
    let reducer = Umap::new(ReducerParams::for_corpus(n));
    let reduction = reducer
        .fit_transform(&embeddings)
        .context("Failed to reduce embeddings")?;

    println!("Fitting topic model...");
    let clusterer = HdbscanClusterer::new(ClusterParams::for_corpus(n));
    let model = TopicModel::fit(
        &docs,
        &embeddings,
        &reduction,
        &clusterer,
        &CountVectorizer::english(),
        cluster_space,
    )
    .context("Failed to fit topic model")?;

    if reduction.len() != n || model.assignments.len() != n {
        anyhow::bail!(
            "Fitted state is misaligned: {n} documents, {} coordinates, {} assignments",
            reduction.len(),
            model.assignments.len()
        );
    }

    info!(
        documents = n,
        topics = model.topic_count(),
        outliers = model.outlier_count(),
        ?cluster_space,
        "Topic model ready"
    );

    Ok(FittedCorpus {
        docs,
        embeddings,
        reduction,
        model,
    })
}
