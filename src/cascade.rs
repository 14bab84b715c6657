//! Three-stage anomaly cascade
//!
//! Rows start as Anomaly and are promoted to Normal only if they survive
//! every stage: the global outlier forest, the batch-relative density
//! filter, then the one-class boundary. One vote against "normal" is enough
//! to reject, which trades precision on the Normal label for recall on
//! anomalies.
//!
//! Survivor sets are carried as explicit index vectors into the original
//! row space, so the narrowing invariant (C ⊆ B ⊆ A ⊆ rows) is directly
//! observable instead of hidden in matrix re-slicing.

use crate::anomaly::{AnomalyDetector, IsolationForest, LocalOutlierFactor, OneClassSvm};
use crate::error::Result;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-row verdict produced by the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Normal,
    Anomaly,
}

/// Cascade output: final labels plus the survivor index set of each stage,
/// all in the coordinate space of the input matrix rows.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub labels: Vec<Verdict>,
    pub stage_a_survivors: Vec<usize>,
    pub stage_b_survivors: Vec<usize>,
    pub stage_c_survivors: Vec<usize>,
}

impl CascadeOutcome {
    fn rejected_all(n: usize) -> Self {
        Self {
            labels: vec![Verdict::Anomaly; n],
            stage_a_survivors: Vec::new(),
            stage_b_survivors: Vec::new(),
            stage_c_survivors: Vec::new(),
        }
    }
}

/// Runs the three stages over a feature matrix.
///
/// `forest` and `boundary` are frozen models; `density` is re-fit on each
/// batch's Stage-A survivors. With fewer than two survivors the density
/// stage has no neighborhood to compare against and passes its input
/// through unchanged. A zero-row matrix skips everything.
pub fn run_cascade(
    forest: &IsolationForest,
    density: &LocalOutlierFactor,
    boundary: &OneClassSvm,
    features: &Array2<f64>,
) -> Result<CascadeOutcome> {
    let n = features.nrows();
    if n == 0 {
        return Ok(CascadeOutcome::rejected_all(0));
    }

    // Stage A: global outlier forest over every row.
    let pred_a = forest.predict(features)?;
    let stage_a: Vec<usize> = (0..n).filter(|&i| pred_a[i] == 1).collect();

    // Stage B: local density among the survivors, skipped without a
    // neighborhood.
    let stage_b: Vec<usize> = if stage_a.len() >= 2 {
        let refined = features.select(Axis(0), &stage_a);
        let pred_b = density.fit_predict(&refined)?;
        stage_a
            .iter()
            .zip(pred_b.iter())
            .filter(|(_, &label)| label == 1)
            .map(|(&idx, _)| idx)
            .collect()
    } else {
        stage_a.clone()
    };

    // Stage C: frozen boundary over what is left.
    let stage_c: Vec<usize> = if stage_b.is_empty() {
        Vec::new()
    } else {
        let remaining = features.select(Axis(0), &stage_b);
        let pred_c = boundary.predict(&remaining)?;
        stage_b
            .iter()
            .zip(pred_c.iter())
            .filter(|(_, &label)| label == 1)
            .map(|(&idx, _)| idx)
            .collect()
    };

    let mut labels = vec![Verdict::Anomaly; n];
    for &idx in &stage_c {
        labels[idx] = Verdict::Normal;
    }

    Ok(CascadeOutcome {
        labels,
        stage_a_survivors: stage_a,
        stage_b_survivors: stage_b,
        stage_c_survivors: stage_c,
    })
}
