//! Frozen model bundle: the artifact loaded at process start
//!
//! Bundles the text vectorizer, the Stage-A forest, the Stage-C boundary
//! and the Stage-B hyperparameters into one serialized artifact. After
//! loading the bundle is immutable; concurrent batch calls share it behind
//! an `Arc` and the density filter is constructed per batch, so read-only
//! inference needs no locking.

use crate::anomaly::{AnomalyDetector, IsolationForest, LocalOutlierFactor, OneClassSvm};
use crate::cascade::{run_cascade, CascadeOutcome};
use crate::error::{Result, WardenError};
use crate::features::{build_features, feature_width, LogVectorizer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    vectorizer: LogVectorizer,
    forest: IsolationForest,
    boundary: OneClassSvm,
    density: LocalOutlierFactor,
    feature_width: usize,
}

impl ModelBundle {
    /// An unfitted bundle. Every inference call errors until [`fit`] has
    /// run or a fitted artifact has been loaded.
    ///
    /// [`fit`]: ModelBundle::fit
    pub fn new() -> Self {
        Self {
            vectorizer: LogVectorizer::new(),
            forest: IsolationForest::new().with_contamination(0.05).with_seed(42),
            boundary: OneClassSvm::new().with_nu(0.05),
            density: LocalOutlierFactor::new(20),
            feature_width: 1,
        }
    }

    pub fn with_vectorizer(mut self, vectorizer: LogVectorizer) -> Self {
        self.vectorizer = vectorizer;
        self
    }

    pub fn with_forest(mut self, forest: IsolationForest) -> Self {
        self.forest = forest;
        self
    }

    pub fn with_boundary(mut self, boundary: OneClassSvm) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_density(mut self, density: LocalOutlierFactor) -> Self {
        self.density = density;
        self
    }

    /// Fit every frozen component on a corpus of known-normal log lines and
    /// record the feature width the models now expect.
    pub fn fit(&mut self, corpus: &[&str]) -> Result<()> {
        if corpus.is_empty() {
            return Err(WardenError::DataError(
                "Cannot fit model bundle on an empty corpus".to_string(),
            ));
        }

        self.vectorizer.fit(corpus)?;
        self.feature_width = feature_width(&self.vectorizer);

        let features = build_features(&self.vectorizer, corpus, self.feature_width)?;
        self.forest.fit(&features)?;
        self.boundary.fit(&features)?;

        info!(
            corpus_lines = corpus.len(),
            vocab_size = self.vectorizer.vocab_size(),
            feature_width = self.feature_width,
            "Model bundle fitted"
        );
        Ok(())
    }

    /// Width every feature matrix must have: vectorizer vocabulary plus the
    /// log-level placeholder column.
    pub fn feature_width(&self) -> usize {
        self.feature_width
    }

    pub fn vocab_size(&self) -> usize {
        self.vectorizer.vocab_size()
    }

    /// Embed a batch of known-valid lines into the model input space.
    pub fn build_features(&self, lines: &[&str]) -> Result<Array2<f64>> {
        build_features(&self.vectorizer, lines, self.feature_width)
    }

    /// Run the three-stage cascade over a feature matrix.
    pub fn classify(&self, features: &Array2<f64>) -> Result<CascadeOutcome> {
        if features.nrows() > 0 && features.ncols() != self.feature_width {
            return Err(WardenError::ShapeError {
                expected: self.feature_width,
                actual: features.ncols(),
            });
        }
        run_cascade(&self.forest, &self.density, &self.boundary, features)
    }

    /// Serialize the bundle to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| WardenError::SerializationError(e.to_string()))?;
        std::fs::write(path.as_ref(), bytes)?;
        info!(path = %path.as_ref().display(), "Model bundle saved");
        Ok(())
    }

    /// Load a bundle from disk. Failure here is fatal at process start;
    /// it is never retried per request.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let bundle: Self = bincode::deserialize(&bytes)
            .map_err(|e| WardenError::SerializationError(e.to_string()))?;
        info!(
            path = %path.as_ref().display(),
            feature_width = bundle.feature_width,
            "Model bundle loaded"
        );
        Ok(bundle)
    }
}

impl Default for ModelBundle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::Verdict;

    fn normal_corpus() -> Vec<String> {
        let mut lines = Vec::new();
        for i in 0..40 {
            lines.push(format!(
                r#"192.168.1.{} - - [10/Oct/2023:13:55:{:02} -0700] "GET /index.html HTTP/1.1" 200"#,
                i % 20,
                i % 60,
            ));
            lines.push(format!(
                r#"10.0.0.{} - - [10/Oct/2023:14:01:{:02} -0700] "GET /about HTTP/1.1" 200"#,
                i % 10,
                i % 60,
            ));
        }
        lines
    }

    fn fitted_bundle() -> ModelBundle {
        let corpus = normal_corpus();
        let refs: Vec<&str> = corpus.iter().map(|s| s.as_str()).collect();
        let mut bundle = ModelBundle::new();
        bundle.fit(&refs).unwrap();
        bundle
    }

    #[test]
    fn test_fit_records_width() {
        let bundle = fitted_bundle();
        assert_eq!(bundle.feature_width(), bundle.vocab_size() + 1);
    }

    #[test]
    fn test_fit_on_empty_corpus_errors() {
        let mut bundle = ModelBundle::new();
        assert!(bundle.fit(&[]).is_err());
    }

    #[test]
    fn test_classify_familiar_traffic_as_normal() {
        let bundle = fitted_bundle();
        let lines = vec![
            r#"192.168.1.5 - - [10/Oct/2023:13:55:01 -0700] "GET /index.html HTTP/1.1" 200"#,
            r#"10.0.0.3 - - [10/Oct/2023:14:01:02 -0700] "GET /about HTTP/1.1" 200"#,
            r#"192.168.1.7 - - [10/Oct/2023:13:55:09 -0700] "GET /index.html HTTP/1.1" 200"#,
        ];
        let features = bundle.build_features(&lines).unwrap();
        let outcome = bundle.classify(&features).unwrap();
        let normal = outcome
            .labels
            .iter()
            .filter(|&&l| l == Verdict::Normal)
            .count();
        assert!(normal >= 2);
    }

    #[test]
    fn test_classify_rejects_wrong_width() {
        let bundle = fitted_bundle();
        let bad = Array2::zeros((2, 3));
        assert!(matches!(
            bundle.classify(&bad),
            Err(WardenError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let bundle = fitted_bundle();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.bin");

        bundle.save(&path).unwrap();
        let loaded = ModelBundle::load(&path).unwrap();
        assert_eq!(loaded.feature_width(), bundle.feature_width());

        let lines =
            vec![r#"192.168.1.5 - - [10/Oct/2023:13:55:01 -0700] "GET /index.html HTTP/1.1" 200"#];
        let a = bundle.build_features(&lines).unwrap();
        let b = loaded.build_features(&lines).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_missing_artifact_errors() {
        assert!(ModelBundle::load("/nonexistent/bundle.bin").is_err());
    }
}
