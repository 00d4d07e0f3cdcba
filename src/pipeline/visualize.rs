// Visualization stage: render and write each artifact independently.
//
// A failure in one artifact is reported and the others still run. Nothing
// here is fatal: when anything failed the topic info table is printed so the
// trained model is still visible, and the caller carries on.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::corpus::CorpusPaths;
use crate::output::{terminal, writer};
use crate::render::datamap::{load_font, render_datamap};
use crate::render::dendrogram::render_topic_dendrogram;
use crate::render::scatter::render_document_scatter;
use crate::render::Artifact;
use crate::topics::{hierarchical_topics, TopicModel};

/// Result of the visualization stage.
#[derive(Debug, Default)]
pub struct VisualizationOutcome {
    pub saved: Vec<(Artifact, PathBuf)>,
    pub failed: Vec<(Artifact, anyhow::Error)>,
}

impl VisualizationOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_artifacts(&self) -> Vec<Artifact> {
        self.failed.iter().map(|(a, _)| *a).collect()
    }
}

/// Output path of an artifact.
pub fn artifact_path(paths: &CorpusPaths, artifact: Artifact) -> &Path {
    match artifact {
        Artifact::DocumentScatter => &paths.document_html,
        Artifact::TopicDendrogram => &paths.hierarchical_html,
        Artifact::Datamap => &paths.datamap_png,
    }
}

/// Render and write all three artifacts.
pub fn visualize(
    model: &TopicModel,
    docs: &[String],
    coords: &[[f32; 2]],
    paths: &CorpusPaths,
    font_path: Option<&Path>,
) -> VisualizationOutcome {
    println!("\nCreating visualizations...");
    let mut outcome = VisualizationOutcome::default();

    for artifact in Artifact::ALL {
        println!("Creating {artifact}...");
        let path = artifact_path(paths, artifact);
        match build_artifact(artifact, model, docs, coords, path, font_path) {
            Ok(()) => {
                info!(%artifact, path = %path.display(), "Saved artifact");
                terminal::display_saved(path);
                outcome.saved.push((artifact, path.to_path_buf()));
            }
            Err(e) => {
                warn!(%artifact, error = %e, "Visualization failed");
                terminal::display_visualization_error(artifact, &e);
                outcome.failed.push((artifact, e));
            }
        }
    }

    if outcome.all_succeeded() {
        println!("\n✓ Successfully created all visualizations!");
    } else {
        println!("The model was trained successfully, but visualization failed.");
        terminal::display_topic_info(&model.topic_info());
        if let Ok(hierarchy) = hierarchical_topics(model) {
            terminal::display_topic_tree(&hierarchy.tree_string());
        }
    }

    let saved: Vec<(Artifact, &Path)> = outcome
        .saved
        .iter()
        .map(|(a, p)| (*a, p.as_path()))
        .collect();
    terminal::display_view_hint(&saved);

    outcome
}

fn build_artifact(
    artifact: Artifact,
    model: &TopicModel,
    docs: &[String],
    coords: &[[f32; 2]],
    path: &Path,
    font_path: Option<&Path>,
) -> Result<()> {
    match artifact {
        Artifact::DocumentScatter => {
            let html = render_document_scatter(model, docs, coords)?;
            writer::write_html(path, &html)
        }
        Artifact::TopicDendrogram => {
            let hierarchy = hierarchical_topics(model)?;
            let html = render_topic_dendrogram(&hierarchy)?;
            writer::write_html(path, &html)
        }
        Artifact::Datamap => {
            let font = load_font(font_path);
            let datamap = render_datamap(model, docs, coords, font.as_ref())?;
            writer::write_png(path, &datamap)
        }
    }
}
