//! Local Outlier Factor: the cascade's batch-relative density filter
//!
//! Unlike the other two stages this is not a frozen artifact. It is re-fit
//! on every batch and compares each point's density to the density of its
//! neighbors within that batch (leave-one-out). A line's label can therefore
//! differ between batches with different companions; within one batch the
//! result is deterministic.

use crate::error::{Result, WardenError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Batch-relative local density filter.
///
/// Only meaningful for batches of two or more rows; the cascade skips it
/// otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalOutlierFactor {
    n_neighbors: usize,
    /// Scores above this factor are outliers. 1.0 means "as dense as the
    /// neighborhood"; 1.5 is the usual slack for genuinely local points.
    offset: f64,
}

impl LocalOutlierFactor {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            offset: 1.5,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset.max(1.0);
        self
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    fn euclidean(a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Leave-one-out LOF scores for every row of the batch.
    pub fn score_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let n = x.nrows();
        if n < 2 {
            return Err(WardenError::DataError(
                "Local density comparison needs at least 2 rows".to_string(),
            ));
        }
        let k = self.n_neighbors.min(n - 1);

        let rows: Vec<Vec<f64>> = x.rows().into_iter().map(|r| r.to_vec()).collect();

        // k nearest neighbors per point, self excluded.
        let mut neighbors: Vec<Vec<(usize, f64)>> = Vec::with_capacity(n);
        let mut k_dist = vec![0.0f64; n];
        for i in 0..n {
            let mut dists: Vec<(usize, f64)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, Self::euclidean(&rows[i], &rows[j])))
                .collect();
            dists.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            dists.truncate(k);
            k_dist[i] = dists.last().map(|&(_, d)| d).unwrap_or(0.0);
            neighbors.push(dists);
        }

        // Local reachability density per point.
        let mut lrd = vec![0.0f64; n];
        for i in 0..n {
            let reach_sum: f64 = neighbors[i]
                .iter()
                .map(|&(j, d)| k_dist[j].max(d))
                .sum();
            lrd[i] = if reach_sum == 0.0 {
                f64::INFINITY
            } else {
                neighbors[i].len() as f64 / reach_sum
            };
        }

        // LOF = mean neighbor density relative to own density.
        let scores: Vec<f64> = (0..n)
            .map(|i| {
                // Duplicate-heavy neighborhoods collapse to infinite density
                // on both sides; treat the point as locally ordinary.
                if !lrd[i].is_finite() || lrd[i] == 0.0 {
                    return 1.0;
                }
                let ratio_sum: f64 = neighbors[i].iter().map(|&(j, _)| lrd[j] / lrd[i]).sum();
                ratio_sum / neighbors[i].len() as f64
            })
            .collect();

        Ok(Array1::from_vec(scores))
    }

    /// Fit on the batch and label it in one step: +1 inlier, -1 outlier.
    pub fn fit_predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        let scores = self.score_batch(x)?;
        Ok(scores.mapv(|s| if s > self.offset { -1 } else { 1 }))
    }
}

impl Default for LocalOutlierFactor {
    fn default() -> Self {
        Self::new(20)
    }
}
