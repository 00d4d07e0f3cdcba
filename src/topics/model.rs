// Topic model — clusters turned into named, keyword-described topics.
//
// Fitting runs in one blocking pass over the whole corpus:
//   cluster labels -> topics renumbered by size -> per-topic documents ->
//   bag-of-words -> class TF-IDF -> keywords, names, representative docs.
// Only hard assignments are kept; no per-document probabilities.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use super::ctfidf::{cosine, ClassTfidf};
use super::vectorizer::{CountVectorizer, FittedVectorizer};
use crate::cluster::{DocumentClusterer, NOISE_LABEL};
use crate::config::ClusterSpace;
use crate::reduce::FittedReduction;

/// Keywords kept per topic.
pub const TOP_N_WORDS: usize = 10;

/// Keywords used to build a topic name.
pub const NAME_WORDS: usize = 4;

/// Representative documents kept per topic.
pub const REPRESENTATIVE_DOCS: usize = 3;

/// Topic id for documents that belong to no topic.
pub const NOISE_TOPIC: i32 = NOISE_LABEL;

/// One fitted topic.
#[derive(Debug, Clone, Serialize)]
pub struct Topic {
    pub id: i32,
    /// Number of documents assigned to this topic
    pub count: usize,
    /// `"{id}_{w1}_{w2}_{w3}_{w4}"`
    pub name: String,
    /// Top keywords with their class TF-IDF scores, best first
    pub keywords: Vec<(String, f64)>,
    pub representative_docs: Vec<String>,
}

impl Topic {
    pub fn is_noise(&self) -> bool {
        self.id == NOISE_TOPIC
    }

    /// The first `n` keywords, without scores.
    pub fn top_words(&self, n: usize) -> Vec<&str> {
        self.keywords.iter().take(n).map(|(w, _)| w.as_str()).collect()
    }
}

/// A row of the topic info table.
#[derive(Debug, Clone, Serialize)]
pub struct TopicInfoRow {
    pub topic: i32,
    pub count: usize,
    pub name: String,
    pub representation: Vec<String>,
    pub representative_docs: Vec<String>,
}

/// Fitted topic model. Read-only after `fit`.
#[derive(Debug, Clone)]
pub struct TopicModel {
    /// Topic id per document, in corpus order
    pub assignments: Vec<i32>,
    /// Topics ordered by id (noise first when present)
    topics: Vec<Topic>,
    /// Row of `bow` / `ctfidf_matrix` for each topic id
    rows: HashMap<i32, usize>,
    vectorizer: FittedVectorizer,
    ctfidf: ClassTfidf,
    bow: Vec<Vec<f64>>,
    ctfidf_matrix: Vec<Vec<f64>>,
}

impl TopicModel {
    /// Fit the model over the full corpus.
    ///
    /// `reduction` is the already-fitted projection of `embeddings`; it is
    /// reused as-is. `cluster_space` picks which point set the clusterer sees.
    pub fn fit(
        docs: &[String],
        embeddings: &[Vec<f32>],
        reduction: &FittedReduction,
        clusterer: &dyn DocumentClusterer,
        vectorizer: &CountVectorizer,
        cluster_space: ClusterSpace,
    ) -> Result<Self> {
        if docs.len() != embeddings.len() || docs.len() != reduction.len() {
            anyhow::bail!(
                "Misaligned inputs: {} documents, {} embeddings, {} reduced points",
                docs.len(),
                embeddings.len(),
                reduction.len()
            );
        }

        let labels = match cluster_space {
            ClusterSpace::Reduced => clusterer.fit_predict(&reduction.points())?,
            ClusterSpace::Embeddings => clusterer.fit_predict(embeddings)?,
        };
        if labels.len() != docs.len() {
            anyhow::bail!(
                "Clusterer returned {} labels for {} documents",
                labels.len(),
                docs.len()
            );
        }

        Self::from_assignments(docs, &sort_by_frequency(&labels), vectorizer)
    }

    /// Build topics from final assignments (ids already ordered by size).
    pub fn from_assignments(
        docs: &[String],
        assignments: &[i32],
        vectorizer: &CountVectorizer,
    ) -> Result<Self> {
        if docs.len() != assignments.len() {
            anyhow::bail!(
                "{} topic assignments for {} documents",
                assignments.len(),
                docs.len()
            );
        }
        if docs.is_empty() {
            anyhow::bail!("Cannot fit a topic model on an empty corpus");
        }

        let grouped = group_documents(docs, assignments);
        let topic_ids: Vec<i32> = grouped.keys().copied().collect();
        let class_docs: Vec<String> = grouped.values().map(|d| d.join(" ")).collect();

        let fitted = vectorizer.fit(&class_docs)?;
        let bow = fitted.transform_all(&class_docs);
        let ctfidf = ClassTfidf::fit(&bow);
        let ctfidf_matrix = ctfidf.transform(&bow);

        let mut topics = Vec::with_capacity(topic_ids.len());
        for (row, (&id, members)) in grouped.iter().enumerate() {
            let keywords = top_keywords(&ctfidf_matrix[row], fitted.terms(), TOP_N_WORDS);
            let representative_docs =
                representative_docs(members, &ctfidf_matrix[row], &fitted, &ctfidf);
            topics.push(Topic {
                id,
                count: members.len(),
                name: topic_name(id, &keywords),
                keywords,
                representative_docs,
            });
        }

        let rows = topic_ids.iter().enumerate().map(|(r, &id)| (id, r)).collect();

        let model = Self {
            assignments: assignments.to_vec(),
            topics,
            rows,
            vectorizer: fitted,
            ctfidf,
            bow,
            ctfidf_matrix,
        };

        info!(
            topics = model.topic_count(),
            outliers = model.outlier_count(),
            vocabulary = model.vectorizer.len(),
            "Fitted topic model"
        );

        Ok(model)
    }

    /// All topics ordered by id, noise first.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn get_topic(&self, id: i32) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    /// Number of real topics (noise excluded).
    pub fn topic_count(&self) -> usize {
        self.topics.iter().filter(|t| !t.is_noise()).count()
    }

    /// Number of documents assigned to no topic.
    pub fn outlier_count(&self) -> usize {
        self.assignments.iter().filter(|&&t| t == NOISE_TOPIC).count()
    }

    /// Documents per topic id, noise included.
    pub fn topic_distribution(&self) -> BTreeMap<i32, usize> {
        self.topics.iter().map(|t| (t.id, t.count)).collect()
    }

    /// The topic info table.
    pub fn topic_info(&self) -> Vec<TopicInfoRow> {
        self.topics
            .iter()
            .map(|t| TopicInfoRow {
                topic: t.id,
                count: t.count,
                name: t.name.clone(),
                representation: t.keywords.iter().map(|(w, _)| w.clone()).collect(),
                representative_docs: t.representative_docs.clone(),
            })
            .collect()
    }

    /// Topic display label: the name without its numeric prefix.
    pub fn label(&self, id: i32) -> String {
        match self.get_topic(id) {
            Some(t) if t.is_noise() => "Unlabelled".to_string(),
            Some(t) => t.top_words(3).join(" / "),
            None => format!("Topic {id}"),
        }
    }

    pub fn vectorizer(&self) -> &FittedVectorizer {
        &self.vectorizer
    }

    pub fn ctfidf(&self) -> &ClassTfidf {
        &self.ctfidf
    }

    /// Class TF-IDF vector of a topic.
    pub fn topic_vector(&self, id: i32) -> Option<&[f64]> {
        self.rows.get(&id).map(|&r| self.ctfidf_matrix[r].as_slice())
    }

    /// Bag-of-words row of a topic.
    pub fn topic_bow(&self, id: i32) -> Option<&[f64]> {
        self.rows.get(&id).map(|&r| self.bow[r].as_slice())
    }
}

/// Renumber cluster labels so topic 0 is the largest cluster, 1 the next,
/// and so on. Ties keep the original label order. Noise stays -1.
pub fn sort_by_frequency(labels: &[i32]) -> Vec<i32> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for &l in labels.iter().filter(|&&l| l != NOISE_LABEL) {
        *counts.entry(l).or_insert(0) += 1;
    }

    let mut ordered: Vec<(i32, usize)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mapping: HashMap<i32, i32> = ordered
        .iter()
        .enumerate()
        .map(|(new, &(old, _))| (old, new as i32))
        .collect();

    labels
        .iter()
        .map(|l| mapping.get(l).copied().unwrap_or(NOISE_TOPIC))
        .collect()
}

/// Group documents by topic id, ordered by id.
pub fn group_documents<'a>(docs: &'a [String], assignments: &[i32]) -> BTreeMap<i32, Vec<&'a str>> {
    let mut grouped: BTreeMap<i32, Vec<&str>> = BTreeMap::new();
    for (doc, &topic) in docs.iter().zip(assignments) {
        grouped.entry(topic).or_default().push(doc.as_str());
    }
    grouped
}

/// Highest-scoring terms of a weighted row. Zero scores are dropped; ties
/// fall back to vocabulary order.
pub fn top_keywords(row: &[f64], terms: &[String], n: usize) -> Vec<(String, f64)> {
    let mut scored: Vec<(usize, f64)> = row
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| *s > 0.0)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
        .into_iter()
        .take(n)
        .map(|(i, s)| (terms[i].clone(), s))
        .collect()
}

/// `"{id}_{w1}_{w2}_{w3}_{w4}"`.
pub fn topic_name(id: i32, keywords: &[(String, f64)]) -> String {
    let words: Vec<&str> = keywords
        .iter()
        .take(NAME_WORDS)
        .map(|(w, _)| w.as_str())
        .collect();
    format!("{id}_{}", words.join("_"))
}

/// The topic's documents closest to the topic itself in class TF-IDF space.
fn representative_docs(
    members: &[&str],
    topic_vector: &[f64],
    vectorizer: &FittedVectorizer,
    ctfidf: &ClassTfidf,
) -> Vec<String> {
    let mut scored: Vec<(usize, f64)> = members
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let weighted = ctfidf.transform_row(&vectorizer.transform(doc));
            (i, cosine(&weighted, topic_vector))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
        .into_iter()
        .take(REPRESENTATIVE_DOCS)
        .map(|(i, _)| members[i].to_string())
        .collect()
}
