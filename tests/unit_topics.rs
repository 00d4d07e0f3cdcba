// Unit tests for topic modelling through the public API.
//
// Covers vocabulary pruning, class TF-IDF weighting, topic renumbering and
// naming, representative documents and the topic hierarchy.

use topicmap::topics::ctfidf::ClassTfidf;
use topicmap::topics::model::{sort_by_frequency, top_keywords, REPRESENTATIVE_DOCS, TOP_N_WORDS};
use topicmap::topics::{hierarchical_topics, CountVectorizer, TopicModel, NOISE_TOPIC};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn three_topic_corpus() -> (Vec<String>, Vec<i32>) {
    let docs = strings(&[
        "rust compiler borrow checker errors",
        "rust lifetimes and the borrow checker",
        "cargo builds rust crates",
        "sourdough bread needs flour and yeast",
        "baking bread with rye flour",
        "galaxy clusters seen by the telescope",
        "telescope images of a distant galaxy",
        "the weather today",
    ]);
    (docs, vec![0, 0, 0, 1, 1, 2, 2, -1])
}

// ============================================================
// CountVectorizer
// ============================================================

#[test]
fn stop_words_never_reach_the_vocabulary() {
    let fitted = CountVectorizer::english()
        .fit(&strings(&["the compiler and the borrow checker"]))
        .unwrap();
    assert!(!fitted.terms().iter().any(|t| t == "the" || t == "and"));
    assert!(fitted.terms().iter().any(|t| t == "compiler"));
}

#[test]
fn transform_ignores_unknown_terms() {
    let fitted = CountVectorizer::without_stop_words(1, 1.0)
        .fit(&strings(&["alpha beta"]))
        .unwrap();
    assert_eq!(fitted.transform("gamma delta"), vec![0.0, 0.0]);
}

// ============================================================
// Class TF-IDF
// ============================================================

#[test]
fn ctfidf_rows_of_empty_classes_are_zero() {
    let bow = vec![vec![2.0, 0.0], vec![0.0, 0.0]];
    let model = ClassTfidf::fit(&bow);
    let rows = model.transform(&bow);
    assert!(rows[1].iter().all(|&v| v == 0.0));
    assert!(rows[0][0] > 0.0);
}

#[test]
fn top_keywords_drop_zero_scores() {
    let terms = strings(&["a", "b", "c"]);
    let kw = top_keywords(&[0.0, 0.5, 0.2], &terms, 10);
    assert_eq!(kw.len(), 2);
    assert_eq!(kw[0].0, "b");
}

// ============================================================
// TopicModel
// ============================================================

#[test]
fn largest_cluster_becomes_topic_zero() {
    let labels = vec![7, 7, 3, 3, 3, 3, -1, 7];
    let sorted = sort_by_frequency(&labels);
    assert_eq!(sorted, vec![1, 1, 0, 0, 0, 0, -1, 1]);
}

#[test]
fn topic_counts_sum_to_corpus_size() {
    let (docs, assignments) = three_topic_corpus();
    let model =
        TopicModel::from_assignments(&docs, &assignments, &CountVectorizer::english()).unwrap();
    let total: usize = model.topics().iter().map(|t| t.count).sum();
    assert_eq!(total, docs.len());
    assert_eq!(model.topic_count(), 3);
    assert_eq!(model.outlier_count(), 1);
}

#[test]
fn topic_names_start_with_their_id() {
    let (docs, assignments) = three_topic_corpus();
    let model =
        TopicModel::from_assignments(&docs, &assignments, &CountVectorizer::english()).unwrap();
    for topic in model.topics() {
        assert!(topic.name.starts_with(&format!("{}_", topic.id)), "{}", topic.name);
        assert!(topic.keywords.len() <= TOP_N_WORDS);
        assert!(topic.representative_docs.len() <= REPRESENTATIVE_DOCS);
        assert!(topic.name.split('_').count() <= 5);
    }
}

#[test]
fn representative_docs_come_from_the_topic() {
    let (docs, assignments) = three_topic_corpus();
    let model =
        TopicModel::from_assignments(&docs, &assignments, &CountVectorizer::english()).unwrap();
    for topic in model.topics() {
        for rep in &topic.representative_docs {
            let index = docs.iter().position(|d| d == rep).unwrap();
            assert_eq!(assignments[index], topic.id);
        }
    }
}

#[test]
fn topic_info_lists_noise_first() {
    let (docs, assignments) = three_topic_corpus();
    let model =
        TopicModel::from_assignments(&docs, &assignments, &CountVectorizer::english()).unwrap();
    let info = model.topic_info();
    assert_eq!(info[0].topic, NOISE_TOPIC);
    assert_eq!(info.len(), 4);
    let json = serde_json::to_string(&info).unwrap();
    assert!(json.contains("representative_docs"));
}

// ============================================================
// Hierarchy
// ============================================================

#[test]
fn hierarchy_root_contains_every_topic() {
    let (docs, assignments) = three_topic_corpus();
    let model =
        TopicModel::from_assignments(&docs, &assignments, &CountVectorizer::english()).unwrap();
    let hierarchy = hierarchical_topics(&model).unwrap();
    assert_eq!(hierarchy.merges.len(), 2);
    assert_eq!(hierarchy.root().unwrap().topics, vec![0, 1, 2]);
    for merge in &hierarchy.merges {
        assert!(merge.distance >= 0.0);
        assert!(merge.child_left_id < merge.parent_id);
        assert!(merge.child_right_id < merge.parent_id);
    }
}

#[test]
fn hierarchy_needs_two_topics() {
    let docs = strings(&["alpha beta", "beta gamma", "noise words"]);
    let model = TopicModel::from_assignments(
        &docs,
        &[0, 0, -1],
        &CountVectorizer::without_stop_words(1, 1.0),
    )
    .unwrap();
    assert!(hierarchical_topics(&model).is_err());
}
