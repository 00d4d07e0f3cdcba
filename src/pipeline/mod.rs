// Topic map pipeline: load -> embed -> reduce -> fit topics -> visualize.
//
// Loading and fitting are fatal on error. The visualization stage recovers
// from its own failures, so a run that fits a model always returns Ok.

pub mod fit;
pub mod visualize;

use std::path::PathBuf;

use anyhow::Result;

use crate::config::Config;
use crate::corpus::{load_documents, CorpusPaths};
use crate::embeddings::traits::DocumentEmbedder;
use crate::output::terminal;
use crate::render::Artifact;

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub documents: usize,
    /// Topics excluding noise
    pub topic_count: usize,
    pub outliers: usize,
    pub saved: Vec<(Artifact, PathBuf)>,
    pub failed: Vec<Artifact>,
}

/// Run the whole pipeline for one corpus file.
pub fn run(config: &Config, paths: &CorpusPaths, embedder: &dyn DocumentEmbedder) -> Result<RunSummary> {
    let docs = load_documents(&paths.input)?;
    println!("Loaded {} documents", docs.len());

    let fitted = fit::fit_corpus(docs, embedder, config.cluster_space)?;

    terminal::display_topic_summary(
        fitted.model.topic_count(),
        &fitted.model.topic_distribution(),
    );

    let outcome = visualize::visualize(
        &fitted.model,
        &fitted.docs,
        fitted.coordinates(),
        paths,
        config.font_path.as_deref(),
    );

    Ok(RunSummary {
        documents: fitted.docs.len(),
        topic_count: fitted.model.topic_count(),
        outliers: fitted.model.outlier_count(),
        failed: outcome.failed_artifacts(),
        saved: outcome.saved,
    })
}
