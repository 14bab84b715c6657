//! One-class boundary model: the cascade's final frozen stage

use crate::anomaly::AnomalyDetector;
use crate::error::{Result, WardenError};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Kernel function for the boundary model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// K(x, y) = x . y
    Linear,
    /// K(x, y) = exp(-gamma * ||x - y||^2)
    Rbf { gamma: f64 },
}

impl KernelType {
    fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            KernelType::Linear => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
            KernelType::Rbf { gamma } => {
                let sq_dist: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
                (-gamma * sq_dist).exp()
            }
        }
    }
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::Rbf { gamma: 1.0 }
    }
}

/// One-class boundary classifier over the learned "normal" region.
///
/// Fitted once on known-normal traffic and frozen. A point's decision value
/// is its mean kernel similarity to the stored support set; points below
/// the offset learned at fit time (the nu-quantile of the training decision
/// values) fall outside the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneClassSvm {
    kernel: KernelType,
    /// Upper bound on the fraction of training points left outside the
    /// boundary.
    nu: f64,
    support: Option<Array2<f64>>,
    rho: Option<f64>,
}

impl OneClassSvm {
    pub fn new() -> Self {
        Self {
            kernel: KernelType::default(),
            nu: 0.05,
            support: None,
            rho: None,
        }
    }

    pub fn with_kernel(mut self, kernel: KernelType) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_nu(mut self, nu: f64) -> Self {
        self.nu = nu.clamp(0.0, 0.5);
        self
    }

    /// Mean kernel similarity of each row to the support set.
    fn decision_values(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let support = self
            .support
            .as_ref()
            .ok_or_else(|| WardenError::ModelNotFitted("one-class boundary".to_string()))?;

        if x.ncols() != support.ncols() {
            return Err(WardenError::ShapeError {
                expected: support.ncols(),
                actual: x.ncols(),
            });
        }

        let rows: Vec<Vec<f64>> = x.rows().into_iter().map(|r| r.to_vec()).collect();
        let values: Vec<f64> = rows
            .par_iter()
            .map(|row| {
                let sum: f64 = support
                    .rows()
                    .into_iter()
                    .map(|sv| self.kernel.eval(row, sv.as_slice().unwrap_or(&[])))
                    .sum();
                sum / support.nrows() as f64
            })
            .collect();

        Ok(Array1::from_vec(values))
    }
}

impl Default for OneClassSvm {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyDetector for OneClassSvm {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(WardenError::DataError(
                "Cannot fit one-class boundary on an empty matrix".to_string(),
            ));
        }

        self.support = Some(x.clone());

        // Offset: the nu-quantile of training decision values, so at most a
        // nu fraction of the training set falls outside its own boundary.
        let values = self.decision_values(x)?;
        let mut sorted: Vec<f64> = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let cut = ((self.nu * n as f64) as usize).min(n - 1);
        self.rho = Some(sorted[cut]);

        Ok(())
    }

    /// Anomaly score: distance below the boundary offset (negative inside).
    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let rho = self.threshold();
        let values = self.decision_values(x)?;
        Ok(values.mapv(|v| rho - v))
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        let rho = self.threshold();
        let values = self.decision_values(x)?;
        Ok(values.mapv(|v| if v >= rho { 1 } else { -1 }))
    }

    fn threshold(&self) -> f64 {
        self.rho.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> Array2<f64> {
        let mut data = Vec::new();
        for i in 0..30 {
            data.push((i % 5) as f64 * 0.1);
            data.push(((i % 5) + 1) as f64 * 0.1);
        }
        Array2::from_shape_vec((30, 2), data).unwrap()
    }

    #[test]
    fn test_training_cluster_stays_inside() {
        let mut svm = OneClassSvm::new().with_nu(0.05);
        let x = cluster();
        svm.fit(&x).unwrap();

        let labels = svm.predict(&x).unwrap();
        let inside = labels.iter().filter(|&&l| l == 1).count();
        assert!(inside >= 28);
    }

    #[test]
    fn test_distant_point_falls_outside() {
        let mut svm = OneClassSvm::new().with_nu(0.05);
        svm.fit(&cluster()).unwrap();

        let far = Array2::from_shape_vec((1, 2), vec![50.0, 50.0]).unwrap();
        assert_eq!(svm.predict(&far).unwrap()[0], -1);
    }

    #[test]
    fn test_width_mismatch_errors() {
        let mut svm = OneClassSvm::new();
        svm.fit(&cluster()).unwrap();
        let bad = Array2::zeros((2, 5));
        assert!(matches!(
            svm.predict(&bad),
            Err(WardenError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_unfitted_predict_errors() {
        let svm = OneClassSvm::new();
        assert!(matches!(
            svm.predict(&Array2::zeros((1, 2))),
            Err(WardenError::ModelNotFitted(_))
        ));
    }

    #[test]
    fn test_linear_kernel() {
        let mut svm = OneClassSvm::new().with_kernel(KernelType::Linear).with_nu(0.1);
        svm.fit(&cluster()).unwrap();
        let labels = svm.predict(&cluster()).unwrap();
        assert!(labels.iter().filter(|&&l| l == 1).count() >= 25);
    }
}
