//! Isolation Forest: the cascade's global outlier stage

use crate::anomaly::AnomalyDetector;
use crate::error::{Result, WardenError};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

const EULER_MASCHERONI: f64 = 0.5772156649;

/// A node in a flattened isolation tree. Children are arena indices rather
/// than boxed subtrees, so a serialized forest stays compact and traversal
/// is a tight loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// Single isolation tree stored as an arena of nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IsoTree {
    nodes: Vec<Node>,
    root: usize,
}

impl IsoTree {
    fn build(x: &Array2<f64>, sample: &[usize], max_depth: usize, rng: &mut impl Rng) -> Self {
        let mut nodes = Vec::new();
        let root = Self::grow(x, sample, 0, max_depth, rng, &mut nodes);
        Self { nodes, root }
    }

    /// Grows a subtree and returns its arena index. Children are pushed
    /// before their parent, so the root is always the last node.
    fn grow(
        x: &Array2<f64>,
        indices: &[usize],
        depth: usize,
        max_depth: usize,
        rng: &mut impl Rng,
        nodes: &mut Vec<Node>,
    ) -> usize {
        if depth >= max_depth || indices.len() <= 1 {
            nodes.push(Node::Leaf {
                size: indices.len(),
            });
            return nodes.len() - 1;
        }

        let feature = rng.gen_range(0..x.ncols());
        let values: Vec<f64> = indices.iter().map(|&i| x[[i, feature]]).collect();
        let min_val = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        // Constant feature in this subset: nothing left to isolate on.
        if (max_val - min_val).abs() < 1e-12 {
            nodes.push(Node::Leaf {
                size: indices.len(),
            });
            return nodes.len() - 1;
        }

        let threshold = rng.gen_range(min_val..max_val);
        let (lo, hi): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| x[[i, feature]] < threshold);

        if lo.is_empty() || hi.is_empty() {
            nodes.push(Node::Leaf {
                size: indices.len(),
            });
            return nodes.len() - 1;
        }

        let left = Self::grow(x, &lo, depth + 1, max_depth, rng, nodes);
        let right = Self::grow(x, &hi, depth + 1, max_depth, rng, nodes);
        nodes.push(Node::Split {
            feature,
            threshold,
            left,
            right,
        });
        nodes.len() - 1
    }

    fn path_length(&self, sample: &[f64]) -> f64 {
        let mut node = self.root;
        let mut depth = 0usize;
        loop {
            match self.nodes[node] {
                Node::Leaf { size } => return depth as f64 + average_path_length(size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[feature] < threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points;
/// normalizes raw depths into the standard isolation score.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Forest-of-random-partitions outlier detector.
///
/// Trained once on known-normal traffic and then frozen; the decision
/// threshold is the contamination quantile of the training scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    seed: Option<u64>,
    trees: Vec<IsoTree>,
    threshold: Option<f64>,
    subsample_size: usize,
}

impl IsolationForest {
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: None,
            trees: Vec::new(),
            threshold: None,
            subsample_size: 0,
        }
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n.max(1);
        self
    }

    pub fn with_max_samples(mut self, n: usize) -> Self {
        self.max_samples = n.max(1);
        self
    }

    pub fn with_contamination(mut self, c: f64) -> Self {
        self.contamination = c.clamp(0.0, 0.5);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn compute_scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(WardenError::ModelNotFitted("isolation forest".to_string()));
        }

        let c_n = average_path_length(self.subsample_size.max(2));
        let scores: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let sample: Vec<f64> = row.iter().copied().collect();
                let avg_depth: f64 = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(&sample))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                // s(x, n) = 2^(-E[h(x)] / c(n))
                2.0_f64.powf(-avg_depth / c_n)
            })
            .collect();

        Ok(Array1::from_vec(scores))
    }
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyDetector for IsolationForest {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(WardenError::DataError(
                "Cannot fit isolation forest on an empty matrix".to_string(),
            ));
        }

        let subsample = self.max_samples.min(n);
        let max_depth = (subsample as f64).log2().ceil() as usize;

        let mut rng = match self.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        self.trees = (0..self.n_estimators)
            .map(|_| {
                let sample: Vec<usize> = (0..subsample).map(|_| rng.gen_range(0..n)).collect();
                IsoTree::build(x, &sample, max_depth, &mut rng)
            })
            .collect();
        self.subsample_size = subsample;

        let scores = self.compute_scores(x)?;
        let mut sorted: Vec<f64> = scores.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let cut = ((self.contamination * n as f64) as usize).min(n - 1);
        self.threshold = Some(sorted[cut]);

        Ok(())
    }

    fn score_samples(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.compute_scores(x)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>> {
        let threshold = self.threshold();
        let scores = self.score_samples(x)?;
        Ok(scores.mapv(|s| if s > threshold { -1 } else { 1 }))
    }

    fn threshold(&self) -> f64 {
        self.threshold.unwrap_or(0.5)
    }
}
