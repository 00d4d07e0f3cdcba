// Composition tests — the whole pipeline from corpus file to artifacts.
//
// A deterministic fake embedder stands in for the ONNX model, so these tests
// need no network or model files. Scratch corpora and outputs live under the
// system temp directory.

use std::path::{Path, PathBuf};

use anyhow::Result;
use topicmap::config::{ClusterSpace, Config};
use topicmap::corpus::CorpusPaths;
use topicmap::embeddings::traits::DocumentEmbedder;
use topicmap::pipeline::{self, fit, visualize};
use topicmap::render::Artifact;

const DIM: usize = 16;

const TOPIC_WORDS: [&[&str]; 3] = [
    &["rust", "compiler", "borrow", "cargo", "lifetimes", "traits"],
    &["bread", "flour", "yeast", "sourdough", "oven", "dough"],
    &["galaxy", "telescope", "planets", "orbit", "nebula", "astronomy"],
];

/// Embeds a document along the axis of the topic whose words it uses most,
/// plus a small deterministic per-document wobble.
struct KeywordEmbedder;

impl DocumentEmbedder for KeywordEmbedder {
    fn embed(&self, docs: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(docs
            .iter()
            .map(|doc| {
                let lower = doc.to_lowercase();
                let mut v = vec![0.0_f32; DIM];
                for (t, words) in TOPIC_WORDS.iter().enumerate() {
                    v[t] = words.iter().filter(|w| lower.contains(*w)).count() as f32;
                }
                let hash = doc
                    .bytes()
                    .fold(7u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32));
                for (d, slot) in v.iter_mut().enumerate().skip(3) {
                    *slot = ((hash.rotate_left(d as u32) % 100) as f32 / 100.0) * 0.02;
                }
                let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
                v.iter().map(|x| x / norm).collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("topicmap-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(dir: &Path) -> Config {
    Config {
        file_name: "titles".to_string(),
        model_dir: dir.join("models"),
        font_path: None,
        cluster_space: ClusterSpace::Reduced,
    }
}

fn forty_titles() -> String {
    let templates = [
        "{a} and {b} in practice",
        "notes on {a} with {b}",
        "why {a} beats {b}",
        "a short guide to {a} and {b}",
    ];
    let mut lines = Vec::new();
    for i in 0..40 {
        let words = TOPIC_WORDS[i % 3];
        let a = words[i % words.len()];
        let b = words[(i / 3 + 1) % words.len()];
        let template = templates[i % templates.len()];
        lines.push(format!("{} #{i}", template.replace("{a}", a).replace("{b}", b)));
        if i % 10 == 9 {
            lines.push(String::new());
        }
    }
    lines.join("\n")
}

// ============================================================
// Chain: corpus -> embed -> reduce -> topics -> artifacts
// ============================================================

#[test]
fn forty_documents_produce_three_artifacts() {
    let dir = scratch_dir("e2e");
    let paths = CorpusPaths::in_dir(&dir, "titles");
    std::fs::write(&paths.input, forty_titles()).unwrap();

    let summary = pipeline::run(&config(&dir), &paths, &KeywordEmbedder).unwrap();

    assert_eq!(summary.documents, 40);
    assert!(summary.topic_count >= 1, "no topics found");
    assert!(summary.failed.is_empty(), "failed: {:?}", summary.failed);
    assert_eq!(summary.saved.len(), 3);

    for path in [&paths.document_html, &paths.hierarchical_html, &paths.datamap_png] {
        let len = std::fs::metadata(path).unwrap().len();
        assert!(len > 0, "{} is empty", path.display());
    }

    let scatter = std::fs::read_to_string(&paths.document_html).unwrap();
    assert_eq!(scatter.matches("<circle class=\"doc\"").count(), 40);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn single_document_is_fatal() {
    let dir = scratch_dir("single");
    let paths = CorpusPaths::in_dir(&dir, "titles");
    std::fs::write(&paths.input, "only one title here\n").unwrap();

    let err = pipeline::run(&config(&dir), &paths, &KeywordEmbedder).unwrap_err();
    assert!(format!("{err:#}").contains("at least 2 documents"), "{err:#}");
    assert!(!paths.document_html.exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn two_documents_run_end_to_end() {
    let dir = scratch_dir("two");
    let paths = CorpusPaths::in_dir(&dir, "titles");
    let corpus = "rust compiler and the borrow checker\nsourdough bread with rye flour\n";
    std::fs::write(&paths.input, corpus).unwrap();

    let summary = pipeline::run(&config(&dir), &paths, &KeywordEmbedder).unwrap();
    assert_eq!(summary.documents, 2);
    assert_eq!(summary.failed, vec![Artifact::TopicDendrogram]);
    let saved: Vec<Artifact> = summary.saved.iter().map(|(a, _)| *a).collect();
    assert_eq!(saved, vec![Artifact::DocumentScatter, Artifact::Datamap]);
    assert!(paths.document_html.exists());
    assert!(paths.datamap_png.exists());
    assert!(!paths.hierarchical_html.exists());

    let docs = topicmap::corpus::parse_documents(corpus);
    let fitted = fit::fit_corpus(docs, &KeywordEmbedder, ClusterSpace::Reduced).unwrap();
    assert_eq!(fitted.docs.len(), 2);
    assert_eq!(fitted.embeddings.len(), 2);
    assert_eq!(fitted.coordinates().len(), 2);
    assert_eq!(fitted.model.assignments.len(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_corpus_is_fatal() {
    let dir = scratch_dir("missing");
    let paths = CorpusPaths::in_dir(&dir, "nope");
    let err = pipeline::run(&config(&dir), &paths, &KeywordEmbedder).unwrap_err();
    assert!(err.to_string().contains("Failed to read corpus file"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn visualization_failure_is_recovered() {
    let dir = scratch_dir("vizfail");
    let paths = CorpusPaths::in_dir(&dir, "titles");
    let docs = topicmap::corpus::parse_documents(&forty_titles());

    let fitted = fit::fit_corpus(docs, &KeywordEmbedder, ClusterSpace::Reduced).unwrap();

    // Coordinates no longer line up with the documents
    let truncated = &fitted.coordinates()[..10];
    let outcome = visualize::visualize(&fitted.model, &fitted.docs, truncated, &paths, None);

    let failed = outcome.failed_artifacts();
    assert!(failed.contains(&Artifact::DocumentScatter));
    assert!(failed.contains(&Artifact::Datamap));
    assert!(!paths.document_html.exists());
    assert!(!paths.datamap_png.exists());

    // The trained model is still usable
    let info = fitted.model.topic_info();
    assert_eq!(info.iter().map(|r| r.count).sum::<usize>(), 40);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn clustering_on_embeddings_also_runs() {
    let docs = topicmap::corpus::parse_documents(&forty_titles());
    let fitted = fit::fit_corpus(docs, &KeywordEmbedder, ClusterSpace::Embeddings).unwrap();
    assert_eq!(fitted.model.assignments.len(), 40);
    assert!(fitted.model.topic_count() >= 1);
}

#[test]
fn all_sequences_stay_aligned() {
    let docs = topicmap::corpus::parse_documents(&forty_titles());
    let fitted = fit::fit_corpus(docs, &KeywordEmbedder, ClusterSpace::Reduced).unwrap();
    let n = fitted.docs.len();
    assert_eq!(fitted.embeddings.len(), n);
    assert_eq!(fitted.coordinates().len(), n);
    assert_eq!(fitted.model.assignments.len(), n);
}
