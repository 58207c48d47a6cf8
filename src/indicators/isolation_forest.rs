// =============================================================================
// Isolation-Forest Anomaly Score
// =============================================================================
//
// Unlike the rest of this module, the isolation forest is not a pure
// function: it holds fitted state (a small ensemble of random isolation
// trees) built lazily on a rolling window of engineered features, and
// retrained after a configurable number of days. Model blobs are persisted
// as JSON so restarts don't discard fit state (see the strategy host for the
// `data/models/{symbol}_{strategy_version}.json` path convention).

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const DEFAULT_TREE_COUNT: usize = 64;
const DEFAULT_SAMPLE_SIZE: usize = 128;
const MAX_DEPTH_SLACK: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IsolationNode {
    split_feature: usize,
    split_value: f64,
    left: Option<Box<IsolationNode>>,
    right: Option<Box<IsolationNode>>,
    size_at_leaf: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IsolationTree {
    root: Option<IsolationNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    feature_count: usize,
    sample_size: usize,
    trained_at: DateTime<Utc>,
}

/// Average path length of an unsuccessful BST search of `n` items —
/// the standard isolation-forest normalization constant c(n).
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + 0.5772156649) - 2.0 * (n - 1.0) / n
}

impl IsolationTree {
    fn build(data: &[Vec<f64>], depth: usize, max_depth: usize, rng: &mut StdRng) -> Self {
        Self {
            root: Self::build_node(data, depth, max_depth, rng),
        }
    }

    fn build_node(data: &[Vec<f64>], depth: usize, max_depth: usize, rng: &mut StdRng) -> Option<IsolationNode> {
        if data.len() <= 1 || depth >= max_depth {
            return Some(IsolationNode {
                split_feature: 0,
                split_value: 0.0,
                left: None,
                right: None,
                size_at_leaf: data.len(),
            });
        }

        let feature_count = data[0].len();
        let split_feature = rng.gen_range(0..feature_count);

        let values: Vec<f64> = data.iter().map(|row| row[split_feature]).collect();
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        if min == max {
            return Some(IsolationNode {
                split_feature,
                split_value: min,
                left: None,
                right: None,
                size_at_leaf: data.len(),
            });
        }

        let split_value = rng.gen_range(min..max);

        let (left_data, right_data): (Vec<Vec<f64>>, Vec<Vec<f64>>) =
            data.iter().cloned().partition(|row| row[split_feature] < split_value);

        Some(IsolationNode {
            split_feature,
            split_value,
            left: Some(Box::new(Self::build_node(&left_data, depth + 1, max_depth, rng)?)),
            right: Some(Box::new(Self::build_node(&right_data, depth + 1, max_depth, rng)?)),
            size_at_leaf: data.len(),
        })
    }

    fn path_length(&self, features: &[f64]) -> f64 {
        let mut node = match &self.root {
            Some(n) => n,
            None => return 0.0,
        };
        let mut depth = 0.0;
        loop {
            match (&node.left, &node.right) {
                (Some(left), Some(right)) => {
                    depth += 1.0;
                    node = if features[node.split_feature] < node.split_value { left } else { right };
                }
                _ => {
                    return depth + average_path_length(node.size_at_leaf);
                }
            }
        }
    }
}

impl IsolationForest {
    /// Fit a fresh forest from a rolling window of engineered feature rows.
    pub fn fit(data: &[Vec<f64>], seed: u64) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let feature_count = data[0].len();
        if feature_count == 0 || data.iter().any(|row| row.len() != feature_count) {
            return None;
        }

        let sample_size = DEFAULT_SAMPLE_SIZE.min(data.len());
        let max_depth = (sample_size as f64).log2().ceil() as usize + MAX_DEPTH_SLACK;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(DEFAULT_TREE_COUNT);
        for _ in 0..DEFAULT_TREE_COUNT {
            let mut sample: Vec<Vec<f64>> = Vec::with_capacity(sample_size);
            for _ in 0..sample_size {
                let idx = rng.gen_range(0..data.len());
                sample.push(data[idx].clone());
            }
            trees.push(IsolationTree::build(&sample, 0, max_depth, &mut rng));
        }

        Some(Self {
            trees,
            feature_count,
            sample_size,
            trained_at: Utc::now(),
        })
    }

    /// Anomaly score in `(0, 1]`; values close to 1 indicate strong anomalies,
    /// values near or below 0.5 indicate normal points.
    pub fn score(&self, features: &[f64]) -> Option<f64> {
        if features.len() != self.feature_count || self.trees.is_empty() {
            return None;
        }
        let avg_path: f64 =
            self.trees.iter().map(|t| t.path_length(features)).sum::<f64>() / self.trees.len() as f64;
        let c = average_path_length(self.sample_size);
        if c == 0.0 {
            return None;
        }
        let score = 2f64.powf(-avg_path / c);
        score.is_finite().then_some(score)
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.trained_at).num_days()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal_cluster(n: usize) -> Vec<Vec<f64>> {
        (0..n)
            .map(|i| {
                let jitter = (i as f64 * 0.13).sin() * 0.05;
                vec![1.0 + jitter, 2.0 + jitter, 3.0 + jitter]
            })
            .collect()
    }

    #[test]
    fn isolation_forest_rejects_empty_data() {
        assert!(IsolationForest::fit(&[], 1).is_none());
    }

    #[test]
    fn isolation_forest_scores_outlier_higher_than_inlier() {
        let mut data = normal_cluster(150);
        let forest = IsolationForest::fit(&data, 42).unwrap();

        let inlier_score = forest.score(&data[0]).unwrap();
        let outlier = vec![50.0, -50.0, 100.0];
        let outlier_score = forest.score(&outlier).unwrap();

        assert!(outlier_score > inlier_score);
        data.push(outlier);
    }

    #[test]
    fn isolation_forest_round_trips_through_json() {
        let data = normal_cluster(150);
        let forest = IsolationForest::fit(&data, 7).unwrap();
        let json = forest.to_json().unwrap();
        let restored = IsolationForest::from_json(&json).unwrap();
        let point = vec![1.0, 2.0, 3.0];
        assert!((forest.score(&point).unwrap() - restored.score(&point).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn isolation_forest_rejects_mismatched_feature_count() {
        let data = normal_cluster(150);
        let forest = IsolationForest::fit(&data, 3).unwrap();
        assert!(forest.score(&[1.0, 2.0]).is_none());
    }
}
