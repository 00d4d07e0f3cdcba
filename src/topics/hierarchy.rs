// Hierarchical topics — Ward merges over topic keyword vectors.
//
// Leaves are the non-noise topics. Two topics are as far apart as their class
// TF-IDF vectors are dissimilar (1 - cosine). Each merge is named after the
// keywords of everything beneath it, scored with the model's fitted idf.

use anyhow::Result;
use kodama::{linkage, Method};
use serde::Serialize;
use tracing::debug;

use super::ctfidf::cosine;
use super::model::{top_keywords, TopicModel};

/// Keywords in a merged topic's name.
pub const PARENT_NAME_WORDS: usize = 5;

/// One merge of the hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchicalTopic {
    /// Cluster id of the merge: leaf count + merge index
    pub parent_id: usize,
    pub parent_name: String,
    /// Leaf topic ids under this merge, ascending
    pub topics: Vec<i32>,
    pub child_left_id: usize,
    pub child_left_name: String,
    pub child_right_id: usize,
    pub child_right_name: String,
    pub distance: f64,
}

/// The full merge tree.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchicalTopics {
    /// Topic id of each leaf; leaf `i` has cluster id `i`
    pub leaves: Vec<i32>,
    pub leaf_names: Vec<String>,
    /// Merges in order of increasing distance; the last one is the root
    pub merges: Vec<HierarchicalTopic>,
}

impl HierarchicalTopics {
    pub fn n_leaves(&self) -> usize {
        self.leaves.len()
    }

    pub fn root(&self) -> Option<&HierarchicalTopic> {
        self.merges.last()
    }

    /// Merge that created cluster `id`, if `id` is not a leaf.
    pub fn merge(&self, id: usize) -> Option<&HierarchicalTopic> {
        id.checked_sub(self.n_leaves())
            .and_then(|i| self.merges.get(i))
    }

    /// Display name of any cluster id.
    pub fn name(&self, id: usize) -> &str {
        match self.merge(id) {
            Some(m) => &m.parent_name,
            None => self.leaf_names.get(id).map(String::as_str).unwrap_or(""),
        }
    }

    /// Leaf indices in drawing order: left subtree first, from the root down.
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.n_leaves());
        let Some(root) = self.root() else {
            return (0..self.n_leaves()).collect();
        };
        let mut stack = vec![root.parent_id];
        while let Some(id) = stack.pop() {
            match self.merge(id) {
                Some(m) => {
                    stack.push(m.child_right_id);
                    stack.push(m.child_left_id);
                }
                None => order.push(id),
            }
        }
        order
    }

    /// Text rendering of the tree, one node per line.
    pub fn tree_string(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root() {
            self.write_node(root.parent_id, 0, &mut out);
        }
        out
    }

    fn write_node(&self, id: usize, depth: usize, out: &mut String) {
        let indent = "    ".repeat(depth);
        match self.merge(id) {
            Some(m) => {
                out.push_str(&format!("{indent}■── {} ── distance {:.3}\n", m.parent_name, m.distance));
                self.write_node(m.child_left_id, depth + 1, out);
                self.write_node(m.child_right_id, depth + 1, out);
            }
            None => {
                out.push_str(&format!("{indent}└── {}\n", self.name(id)));
            }
        }
    }
}

/// Build the topic hierarchy of a fitted model.
pub fn hierarchical_topics(model: &TopicModel) -> Result<HierarchicalTopics> {
    let topics: Vec<_> = model.topics().iter().filter(|t| !t.is_noise()).collect();
    let n = topics.len();
    if n < 2 {
        anyhow::bail!("Hierarchical topics need at least 2 topics, found {n}");
    }

    let mut vectors = Vec::with_capacity(n);
    let mut bows = Vec::with_capacity(n);
    for t in &topics {
        let (Some(vector), Some(bow)) = (model.topic_vector(t.id), model.topic_bow(t.id)) else {
            anyhow::bail!("Topic {} has no keyword vector", t.id);
        };
        vectors.push(vector);
        bows.push(bow);
    }

    let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n - 1 {
        for j in i + 1..n {
            condensed.push((1.0 - cosine(vectors[i], vectors[j])).max(0.0));
        }
    }

    let dendrogram = linkage(&mut condensed, n, Method::Ward);

    let leaves: Vec<i32> = topics.iter().map(|t| t.id).collect();
    let leaf_names: Vec<String> = topics.iter().map(|t| t.name.clone()).collect();

    // Leaf topics and summed bag-of-words beneath every cluster id
    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    let mut names = leaf_names.clone();
    let mut merges = Vec::with_capacity(n - 1);

    for (step_index, step) in dendrogram.steps().iter().enumerate() {
        let parent_id = n + step_index;
        let mut under: Vec<usize> = members[step.cluster1]
            .iter()
            .chain(&members[step.cluster2])
            .copied()
            .collect();
        under.sort_unstable();

        let parent_name = merged_name(model, &under, &bows);

        merges.push(HierarchicalTopic {
            parent_id,
            parent_name: parent_name.clone(),
            topics: under.iter().map(|&i| leaves[i]).collect(),
            child_left_id: step.cluster1,
            child_left_name: names[step.cluster1].clone(),
            child_right_id: step.cluster2,
            child_right_name: names[step.cluster2].clone(),
            distance: step.dissimilarity,
        });

        members.push(under);
        names.push(parent_name);
    }

    debug!(leaves = n, merges = merges.len(), "Built topic hierarchy");

    Ok(HierarchicalTopics {
        leaves,
        leaf_names,
        merges,
    })
}

fn merged_name(model: &TopicModel, leaves: &[usize], bows: &[&[f64]]) -> String {
    let width = model.vectorizer().len();
    let mut summed = vec![0.0; width];
    for &leaf in leaves {
        for (s, &c) in summed.iter_mut().zip(bows[leaf]) {
            *s += c;
        }
    }
    let weighted = model.ctfidf().transform_row(&summed);
    top_keywords(&weighted, model.vectorizer().terms(), PARENT_NAME_WORDS)
        .into_iter()
        .map(|(w, _)| w)
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::vectorizer::CountVectorizer;

    fn model() -> TopicModel {
        let docs: Vec<String> = vec![
            "rust compiler borrow checker",
            "rust compiler lifetimes",
            "python interpreter scripting",
            "python scripting notebooks",
            "sourdough bread flour",
            "bread flour yeast",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        TopicModel::from_assignments(&docs, &[0, 0, 1, 1, 2, 2], &CountVectorizer::english())
            .unwrap()
    }

    #[test]
    fn test_hierarchy_has_one_merge_per_pair() {
        let h = hierarchical_topics(&model()).unwrap();
        assert_eq!(h.n_leaves(), 3);
        assert_eq!(h.merges.len(), 2);
        let root = h.root().unwrap();
        assert_eq!(root.parent_id, 4);
        assert_eq!(root.topics, vec![0, 1, 2]);
    }

    #[test]
    fn test_merge_distances_are_monotone() {
        let h = hierarchical_topics(&model()).unwrap();
        assert!(h.merges[0].distance <= h.merges[1].distance);
    }

    #[test]
    fn test_leaf_order_covers_every_leaf() {
        let h = hierarchical_topics(&model()).unwrap();
        let mut order = h.leaf_order();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_parent_names_are_keywords() {
        let h = hierarchical_topics(&model()).unwrap();
        for m in &h.merges {
            assert!(!m.parent_name.is_empty());
            assert!(!m.parent_name.contains(' '));
        }
        assert!(h.tree_string().contains(&h.leaf_names[0]));
    }

    #[test]
    fn test_single_topic_is_an_error() {
        let docs: Vec<String> = vec!["alpha beta".into(), "beta gamma".into()];
        let model = TopicModel::from_assignments(
            &docs,
            &[0, 0],
            &CountVectorizer::without_stop_words(1, 1.0),
        )
        .unwrap();
        let err = hierarchical_topics(&model).unwrap_err();
        assert!(err.to_string().contains("at least 2 topics"));
    }
}
