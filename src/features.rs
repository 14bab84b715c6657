//! Feature extraction for log lines
//!
//! A frozen TF-IDF embedding over log tokens, prefixed with one placeholder
//! column so the matrix width matches what the anomaly models were trained
//! on. The width is a hard contract: the models reject anything else.

use crate::error::{Result, WardenError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// TF-IDF vectorizer over a fixed vocabulary of log tokens.
///
/// Unlike prose text, log lines are short and token-dense: no stop words are
/// removed and single-character tokens (status digits, method fragments) are
/// kept. Fitted once on known-normal traffic, then frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    max_features: Option<usize>,
    min_df: usize,
}

impl LogVectorizer {
    pub fn new() -> Self {
        Self {
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            max_features: None,
            min_df: 1,
        }
    }

    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n.max(1));
        self
    }

    pub fn with_min_df(mut self, n: usize) -> Self {
        self.min_df = n.max(1);
        self
    }

    /// Number of terms in the fitted vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    fn tokenize(line: &str) -> Vec<String> {
        line.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect()
    }

    /// Build the vocabulary and idf weights from a corpus.
    pub fn fit(&mut self, corpus: &[&str]) -> Result<()> {
        if corpus.is_empty() {
            return Err(WardenError::DataError(
                "Cannot fit vectorizer on an empty corpus".to_string(),
            ));
        }

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for line in corpus {
            let unique: HashSet<String> = Self::tokenize(line).into_iter().collect();
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.min_df)
            .collect();

        // Deterministic vocabulary: frequency first, term as tie-break.
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if let Some(max_n) = self.max_features {
            terms.truncate(max_n);
        }

        let n_docs = corpus.len() as f64;
        self.vocabulary.clear();
        self.idf = Vec::with_capacity(terms.len());
        for (idx, (term, df)) in terms.into_iter().enumerate() {
            self.idf.push(((n_docs + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
            self.vocabulary.insert(term, idx);
        }

        Ok(())
    }

    /// Embed lines into the fitted vocabulary space, l2-normalized per row.
    pub fn transform(&self, lines: &[&str]) -> Result<Array2<f64>> {
        if self.vocabulary.is_empty() {
            return Err(WardenError::ModelNotFitted("vectorizer".to_string()));
        }

        let mut matrix = Array2::zeros((lines.len(), self.vocabulary.len()));

        for (row, line) in lines.iter().enumerate() {
            for token in Self::tokenize(line) {
                if let Some(&col) = self.vocabulary.get(&token) {
                    matrix[[row, col]] += self.idf[col];
                }
            }

            let norm: f64 = matrix.row(row).iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                matrix.row_mut(row).mapv_inplace(|v| v / norm);
            }
        }

        Ok(matrix)
    }

    pub fn fit_transform(&mut self, corpus: &[&str]) -> Result<Array2<f64>> {
        self.fit(corpus)?;
        self.transform(corpus)
    }
}

impl Default for LogVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Width of the feature matrix for a given vocabulary: the TF-IDF embedding
/// plus the log-level placeholder column.
pub fn feature_width(vectorizer: &LogVectorizer) -> usize {
    vectorizer.vocab_size() + 1
}

/// Assemble the model input matrix for a batch of known-valid lines.
///
/// Column 0 is a reserved placeholder for a categorical log-level feature.
/// It is always zero today but must stay so the shape matches what the
/// frozen models were trained on. `expected_width` is the width recorded at
/// fit time; a mismatch means the artifact and vectorizer are incompatible
/// and is fatal for the whole batch.
pub fn build_features(
    vectorizer: &LogVectorizer,
    lines: &[&str],
    expected_width: usize,
) -> Result<Array2<f64>> {
    let embedding = vectorizer.transform(lines)?;

    let width = embedding.ncols() + 1;
    if width != expected_width {
        return Err(WardenError::ShapeError {
            expected: expected_width,
            actual: width,
        });
    }

    let mut features = Array2::zeros((lines.len(), width));
    features
        .slice_mut(ndarray::s![.., 1..])
        .assign(&embedding);

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform_shape() {
        let corpus = vec!["GET /index.html 200", "POST /login 401", "GET /about 200"];
        let mut v = LogVectorizer::new();
        let m = v.fit_transform(&corpus).unwrap();
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), v.vocab_size());
    }

    #[test]
    fn test_rows_are_l2_normalized() {
        let corpus = vec!["GET /a 200", "GET /b 200"];
        let mut v = LogVectorizer::new();
        let m = v.fit_transform(&corpus).unwrap();
        for row in m.rows() {
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unfitted_transform_errors() {
        let v = LogVectorizer::new();
        assert!(v.transform(&["GET / 200"]).is_err());
    }

    #[test]
    fn test_unseen_tokens_embed_to_zero() {
        let mut v = LogVectorizer::new();
        v.fit(&["alpha beta", "alpha gamma"]).unwrap();
        let m = v.transform(&["zzz qqq"]).unwrap();
        assert!(m.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_placeholder_column_is_zero() {
        let corpus = vec!["GET /a 200", "POST /b 404", "GET /c 200"];
        let mut v = LogVectorizer::new();
        v.fit(&corpus).unwrap();
        let w = feature_width(&v);
        let m = build_features(&v, &corpus, w).unwrap();
        assert_eq!(m.ncols(), v.vocab_size() + 1);
        assert!(m.column(0).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_width_mismatch_is_fatal() {
        let mut v = LogVectorizer::new();
        v.fit(&["GET /a 200"]).unwrap();
        let err = build_features(&v, &["GET /a 200"], 999).unwrap_err();
        assert!(matches!(err, WardenError::ShapeError { .. }));
    }

    #[test]
    fn test_max_features_truncates_vocabulary() {
        let mut v = LogVectorizer::new().with_max_features(2);
        v.fit(&["a b c d", "a b c", "a b"]).unwrap();
        assert_eq!(v.vocab_size(), 2);
    }
}
