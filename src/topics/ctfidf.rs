// Class-based TF-IDF.
//
// All documents of one topic are treated as a single "class document". Term
// frequencies are L1-normalized per class, then weighted by
//
//   idf(t) = ln(1 + A / f(t))
//
// where A is the average number of words per class and f(t) the frequency of
// term t across all classes. Terms that dominate one topic but are rare
// elsewhere float to the top of that topic's keyword list.

/// Fitted idf weights, one per vocabulary column.
#[derive(Debug, Clone)]
pub struct ClassTfidf {
    idf: Vec<f64>,
}

impl ClassTfidf {
    /// Learn idf weights from the per-class bag-of-words matrix.
    pub fn fit(bow: &[Vec<f64>]) -> Self {
        let n_terms = bow.first().map(Vec::len).unwrap_or(0);
        let mut term_freq = vec![0.0_f64; n_terms];
        for row in bow {
            for (f, &count) in term_freq.iter_mut().zip(row) {
                *f += count;
            }
        }

        let total: f64 = term_freq.iter().sum();
        // Whole words per class
        let avg_words = if bow.is_empty() {
            0.0
        } else {
            (total / bow.len() as f64).trunc()
        };

        let idf = term_freq
            .iter()
            .map(|&f| if f > 0.0 { (avg_words / f + 1.0).ln() } else { 0.0 })
            .collect();

        Self { idf }
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Weight one bag-of-words row.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        let sum: f64 = row.iter().sum();
        if sum <= 0.0 {
            return vec![0.0; row.len()];
        }
        row.iter()
            .zip(&self.idf)
            .map(|(&count, &idf)| count / sum * idf)
            .collect()
    }

    pub fn transform(&self, bow: &[Vec<f64>]) -> Vec<Vec<f64>> {
        bow.iter().map(|row| self.transform_row(row)).collect()
    }
}

/// Cosine similarity of two dense vectors; 0.0 when either is all zeros.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    let denom = norm_a * norm_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idf_formula() {
        // Two classes, 4 words each -> A = 4
        let bow = vec![vec![3.0, 1.0, 0.0], vec![0.0, 1.0, 3.0]];
        let model = ClassTfidf::fit(&bow);
        assert!((model.idf()[0] - (4.0_f64 / 3.0 + 1.0).ln()).abs() < 1e-12);
        assert!((model.idf()[1] - (4.0_f64 / 2.0 + 1.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_distinctive_term_outscores_shared_term() {
        let bow = vec![vec![3.0, 3.0, 0.0], vec![0.0, 3.0, 3.0]];
        let model = ClassTfidf::fit(&bow);
        let row = model.transform_row(&bow[0]);
        assert!(row[0] > row[1], "distinctive {} vs shared {}", row[0], row[1]);
        assert_eq!(row[2], 0.0);
    }

    #[test]
    fn test_empty_row_is_zero() {
        let model = ClassTfidf::fit(&[vec![1.0, 1.0]]);
        assert_eq!(model.transform_row(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_cosine() {
        assert!((cosine(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
