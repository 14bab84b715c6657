//! Unsupervised anomaly detectors
//!
//! The cascade composes three detectors with different contracts: a frozen
//! global outlier forest, a batch-relative local density filter and a frozen
//! one-class boundary model. The frozen detectors implement
//! [`AnomalyDetector`]; the density filter is deliberately separate because
//! it is re-fit on every batch rather than loaded as an artifact.

mod isolation_forest;
mod lof;
mod ocsvm;

pub use isolation_forest::IsolationForest;
pub use lof::LocalOutlierFactor;
pub use ocsvm::{KernelType, OneClassSvm};

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Common contract for detectors with a frozen decision boundary.
///
/// `predict` returns +1 for inliers and -1 for outliers, matching the
/// convention the cascade narrows on.
pub trait AnomalyDetector {
    /// Fit the detector on known-normal data.
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Raw anomaly score per row; higher means more anomalous.
    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Binary labels per row: +1 inlier, -1 outlier.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>>;

    /// Decision threshold established at fit time.
    fn threshold(&self) -> f64;

    /// Convenience: fit on a batch and label the same batch.
    fn fit_predict(&mut self, x: &Array2<f64>) -> Result<Array1<i32>> {
        self.fit(x)?;
        self.predict(x)
    }
}
