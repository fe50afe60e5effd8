//! Random forest of bootstrap-sampled classification trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::{DecisionTree, TreeConfig};
use super::ModelError;

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Rows drawn (with replacement) per tree; capped at the training size.
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 8,
            min_samples_leaf: 5,
            max_samples: 10_000,
            seed: 42,
        }
    }
}

/// A fitted random forest; predictions average the trees' leaf frequencies.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Train on row-major `features` with boolean `labels`.
    ///
    /// Trees are built in parallel; each tree's bootstrap sample and feature
    /// shuffles derive from `seed + tree_index`, so the fitted forest does not
    /// depend on thread scheduling.
    pub fn fit(
        features: &[Vec<f64>],
        labels: &[bool],
        config: &ForestConfig,
    ) -> Result<Self, ModelError> {
        if features.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if features.len() != labels.len() {
            return Err(ModelError::LabelMismatch {
                rows: features.len(),
                labels: labels.len(),
            });
        }
        let n_features = features[0].len();
        if n_features == 0 {
            return Err(ModelError::NoFeatures);
        }
        if let Some(row) = features.iter().position(|r| r.len() != n_features) {
            return Err(ModelError::RaggedRow { row });
        }

        let n = features.len();
        let sample_size = config.max_samples.clamp(1, n);
        let max_features = ((n_features as f64).sqrt().ceil() as usize).max(1);

        let trees: Vec<DecisionTree> = (0..config.n_trees.max(1))
            .into_par_iter()
            .map(|i| {
                let seed = config.seed.wrapping_add(i as u64);
                let mut rng = StdRng::seed_from_u64(seed);
                let sample: Vec<usize> = (0..sample_size).map(|_| rng.gen_range(0..n)).collect();
                let tree_config = TreeConfig {
                    max_depth: config.max_depth,
                    min_samples_split: config.min_samples_leaf * 2,
                    min_samples_leaf: config.min_samples_leaf,
                    max_features: Some(max_features),
                    seed,
                };
                DecisionTree::fit(features, labels, &sample, &tree_config)
            })
            .collect();

        debug!(trees = trees.len(), rows = n, n_features, "random forest fitted");
        Ok(Self { trees, n_features })
    }

    /// Probability that the label is `true` for one feature row.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        debug_assert_eq!(row.len(), self.n_features);
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Vec<Vec<f64>>, Vec<bool>) {
        let features: Vec<Vec<f64>> = (0..200)
            .map(|i| vec![(i % 50) as f64, (i * 7 % 13) as f64])
            .collect();
        let labels = features.iter().map(|r| r[0] >= 25.0).collect();
        (features, labels)
    }

    #[test]
    fn learns_threshold_rule() {
        let (x, y) = toy_data();
        let config = ForestConfig {
            n_trees: 10,
            ..Default::default()
        };
        let forest = RandomForest::fit(&x, &y, &config).unwrap();
        assert_eq!(forest.n_trees(), 10);
        assert!(forest.predict_proba(&[45.0, 3.0]) > 0.7);
        assert!(forest.predict_proba(&[2.0, 3.0]) < 0.3);
    }

    #[test]
    fn fit_is_deterministic_for_seed() {
        let (x, y) = toy_data();
        let config = ForestConfig {
            n_trees: 8,
            seed: 7,
            ..Default::default()
        };
        let a = RandomForest::fit(&x, &y, &config).unwrap();
        let b = RandomForest::fit(&x, &y, &config).unwrap();
        for row in &x {
            assert_eq!(a.predict_proba(row), b.predict_proba(row));
        }
    }

    #[test]
    fn rejects_empty_and_mismatched_input() {
        let config = ForestConfig::default();
        assert!(matches!(
            RandomForest::fit(&[], &[], &config),
            Err(ModelError::EmptyTrainingSet)
        ));
        assert!(matches!(
            RandomForest::fit(&[vec![1.0]], &[true, false], &config),
            Err(ModelError::LabelMismatch { .. })
        ));
    }
}
