//! Anomaly Detector - isolation forest over the recent telemetry window
//!
//! The model is refit on every call against the current window only; no
//! state survives between calls. Trees are grown in parallel (rayon), each
//! from its own seed drawn from one master RNG, so a fixed seed gives the
//! same scores regardless of thread scheduling.
//!
//! Scoring follows the usual isolation-forest definition:
//! `score(x) = -2^(-E[h(x)] / c(ψ))`, shifted by the batch's own
//! contamination percentile so that negative values are outliers.

use rand::prelude::*;
use rand::seq::index;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnomalyConfig;
use crate::types::ANOMALY_FEATURE_COUNT;

/// One multivariate sample (see `TelemetryRecord::anomaly_features`).
pub type FeatureVector = [f64; ANOMALY_FEATURE_COUNT];

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Outcome of scoring one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub sample_count: usize,
    /// Fraction of samples scoring strictly below the contamination percentile
    pub anomaly_rate: f64,
    /// Worst (lowest) shifted score; `None` for an empty window
    pub min_score: Option<f64>,
}

impl AnomalyReport {
    pub fn empty() -> Self {
        Self {
            sample_count: 0,
            anomaly_rate: 0.0,
            min_score: None,
        }
    }
}

// ============================================================================
// Detector
// ============================================================================

/// Stateless detector; holds only its configuration.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Fit a fresh forest to `samples` and score them. Never fails; an empty
    /// window yields [`AnomalyReport::empty`].
    pub fn analyze(&self, samples: &[FeatureVector]) -> AnomalyReport {
        if samples.is_empty() {
            return AnomalyReport::empty();
        }

        let forest = IsolationForest::fit(samples, &self.config);
        let scores = forest.score_samples(samples);

        let offset = percentile(&scores, self.config.contamination * 100.0);
        let shifted: Vec<f64> = scores.iter().map(|s| s - offset).collect();

        let outliers = shifted.iter().filter(|&&s| s < 0.0).count();
        let anomaly_rate = outliers as f64 / samples.len() as f64;
        let min_score = shifted.iter().copied().fold(None, |acc: Option<f64>, s| {
            Some(acc.map_or(s, |m| m.min(s)))
        });

        debug!(
            samples = samples.len(),
            trees = forest.trees.len(),
            outliers,
            anomaly_rate,
            "Anomaly window scored"
        );

        AnomalyReport {
            sample_count: samples.len(),
            anomaly_rate,
            min_score,
        }
    }
}

// ============================================================================
// Isolation Forest
// ============================================================================

struct IsolationForest {
    trees: Vec<IsolationTree>,
    /// c(ψ) for the subsample size used to grow each tree
    normaliser: f64,
}

impl IsolationForest {
    fn fit(samples: &[FeatureVector], config: &AnomalyConfig) -> Self {
        let subsample = config.max_samples.min(samples.len()).max(1);
        let height_limit = (subsample as f64).log2().ceil() as usize;

        let mut master = StdRng::seed_from_u64(config.seed);
        let seeds: Vec<u64> = (0..config.n_trees.max(1)).map(|_| master.gen()).collect();

        let trees = seeds
            .par_iter()
            .map(|&seed| IsolationTree::grow(samples, subsample, height_limit, seed))
            .collect();

        let c = average_path_length(subsample);
        Self {
            trees,
            normaliser: if c > 0.0 { c } else { 1.0 },
        }
    }

    /// Raw scores in [-1, 0): lower means easier to isolate.
    fn score_samples(&self, samples: &[FeatureVector]) -> Vec<f64> {
        samples
            .par_iter()
            .map(|x| {
                let total: f64 = self.trees.iter().map(|t| t.path_length(x)).sum();
                let mean_depth = total / self.trees.len() as f64;
                -(2f64.powf(-mean_depth / self.normaliser))
            })
            .collect()
    }
}

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Arena-allocated binary partition tree.
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(samples: &[FeatureVector], subsample: usize, height_limit: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let indices = index::sample(&mut rng, samples.len(), subsample).into_vec();
        let mut tree = Self { nodes: Vec::new() };
        tree.build(samples, indices, 0, height_limit, &mut rng);
        tree
    }

    fn build(
        &mut self,
        samples: &[FeatureVector],
        indices: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        if depth >= height_limit || indices.len() <= 1 {
            self.nodes.push(Node::Leaf { size: indices.len() });
            return id;
        }

        // Only features with spread can separate points
        let candidates: Vec<(usize, f64, f64)> = (0..ANOMALY_FEATURE_COUNT)
            .filter_map(|f| {
                let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                    (lo.min(samples[i][f]), hi.max(samples[i][f]))
                });
                (lo.is_finite() && hi.is_finite() && hi > lo).then_some((f, lo, hi))
            })
            .collect();

        let Some(&(feature, lo, hi)) = candidates.choose(rng) else {
            self.nodes.push(Node::Leaf { size: indices.len() });
            return id;
        };
        let threshold = rng.gen_range(lo..hi);

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            indices.into_iter().partition(|&i| samples[i][feature] < threshold);

        // Reserve the slot, children are appended after it
        self.nodes.push(Node::Leaf { size: 0 });
        let left = self.build(samples, left_idx, depth + 1, height_limit, rng);
        let right = self.build(samples, right_idx, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, x: &FeatureVector) -> f64 {
        let mut node = 0;
        let mut depth = 0usize;
        loop {
            match self.nodes.get(node) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    node = if x[*feature] < *threshold { *left } else { *right };
                    depth += 1;
                }
                Some(Node::Leaf { size }) => return depth as f64 + average_path_length(*size),
                None => return depth as f64,
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points, c(n).
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile (`q` in 0..=100) of a non-empty slice.
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

// ============================================================================
// Tests
// ============================================================================
