// Bag-of-words vectorizer with English stop-word removal.
//
// Tokens are lowercased runs of two or more word characters. The vocabulary
// is sorted alphabetically so column order is stable across runs. Terms are
// pruned by document frequency: kept when min_df <= df <= max_df * n_docs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use anyhow::Result;
use regex_lite::Regex;
use stop_words::{get, LANGUAGE};
use tracing::debug;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"))
}

/// Split text into lowercase word tokens (stop words not yet removed).
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    token_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Unfitted vectorizer configuration.
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    /// Minimum number of documents a term must appear in
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in
    pub max_df: f64,
    stop_words: HashSet<String>,
}

impl CountVectorizer {
    /// English stop words removed, min_df = 1, max_df = 0.95.
    pub fn english() -> Self {
        Self {
            min_df: 1,
            max_df: 0.95,
            stop_words: get(LANGUAGE::English)
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
        }
    }

    /// Vectorizer with no stop words, for tests and non-English corpora.
    pub fn without_stop_words(min_df: usize, max_df: f64) -> Self {
        Self {
            min_df,
            max_df,
            stop_words: HashSet::new(),
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Learn the vocabulary of `docs`.
    ///
    /// When the max_df ceiling falls below min_df (one or two documents),
    /// the ceiling is not applied rather than rejecting every term.
    pub fn fit(&self, docs: &[String]) -> Result<FittedVectorizer> {
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for doc in docs {
            let unique: HashSet<String> = tokenize(doc)
                .into_iter()
                .filter(|t| !self.is_stop_word(t))
                .collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let max_doc_count = self.max_df * docs.len() as f64;
        let apply_ceiling = max_doc_count >= self.min_df as f64;

        let terms: Vec<String> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.min_df)
            .filter(|(_, df)| !apply_ceiling || (*df as f64) <= max_doc_count)
            .map(|(term, _)| term)
            .collect();

        if terms.is_empty() {
            anyhow::bail!(
                "Empty vocabulary: {} documents contain no terms after stop-word and frequency pruning",
                docs.len()
            );
        }

        debug!(
            documents = docs.len(),
            terms = terms.len(),
            max_df_applied = apply_ceiling,
            "Fitted vocabulary"
        );

        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        Ok(FittedVectorizer {
            terms,
            index,
            stop_words: self.stop_words.clone(),
        })
    }
}

/// A vectorizer with a learned vocabulary.
#[derive(Debug, Clone)]
pub struct FittedVectorizer {
    terms: Vec<String>,
    index: HashMap<String, usize>,
    stop_words: HashSet<String>,
}

impl FittedVectorizer {
    /// Vocabulary in column order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Term counts of one document over the fitted vocabulary.
    pub fn transform(&self, doc: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.terms.len()];
        for token in tokenize(doc) {
            if self.stop_words.contains(&token) {
                continue;
            }
            if let Some(&col) = self.index.get(&token) {
                row[col] += 1.0;
            }
        }
        row
    }

    pub fn transform_all(&self, docs: &[String]) -> Vec<Vec<f64>> {
        docs.iter().map(|d| self.transform(d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_drops_single_chars() {
        let tokens = tokenize("Rust is a Systems language, v2 I think");
        assert_eq!(tokens, vec!["rust", "is", "systems", "language", "v2", "think"]);
    }

    #[test]
    fn test_english_removes_stop_words() {
        let v = CountVectorizer::english();
        assert!(v.is_stop_word("the"));
        assert!(v.is_stop_word("and"));
        assert!(!v.is_stop_word("compiler"));
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let v = CountVectorizer::without_stop_words(1, 1.0);
        let fitted = v
            .fit(&["zebra apple".to_string(), "mango".to_string()])
            .unwrap();
        assert_eq!(fitted.terms(), ["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_max_df_prunes_ubiquitous_terms() {
        let v = CountVectorizer::without_stop_words(1, 0.95);
        let docs = vec![
            "common alpha".to_string(),
            "common beta".to_string(),
            "common gamma".to_string(),
        ];
        let fitted = v.fit(&docs).unwrap();
        assert!(!fitted.terms().contains(&"common".to_string()));
        assert!(fitted.terms().contains(&"alpha".to_string()));
    }

    #[test]
    fn test_max_df_skipped_for_single_document() {
        let v = CountVectorizer::without_stop_words(1, 0.95);
        let fitted = v.fit(&["only document here".to_string()]).unwrap();
        assert_eq!(fitted.len(), 3);
    }

    #[test]
    fn test_min_df_prunes_rare_terms() {
        let v = CountVectorizer::without_stop_words(2, 1.0);
        let docs = vec!["shared rare".to_string(), "shared other".to_string()];
        let fitted = v.fit(&docs).unwrap();
        assert_eq!(fitted.terms(), ["shared"]);
    }

    #[test]
    fn test_empty_vocabulary_fails() {
        let v = CountVectorizer::english();
        assert!(v.fit(&["the and of".to_string()]).is_err());
    }

    #[test]
    fn test_transform_counts_terms() {
        let v = CountVectorizer::without_stop_words(1, 1.0);
        let fitted = v.fit(&["apple banana".to_string()]).unwrap();
        let row = fitted.transform("banana apple banana cherry");
        assert_eq!(row, vec![1.0, 2.0]);
    }
}
