//! Binary classification tree (Gini impurity, axis-aligned splits).
//!
//! Split search sorts the node's samples once per candidate feature and sweeps
//! the sorted order, so each node costs O(f · n log n) rather than one
//! partition per threshold.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Decision tree configuration
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Maximum depth of tree
    pub max_depth: usize,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            min_samples_split: 10,
            min_samples_leaf: 5,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        prob_up: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// A fitted classification tree predicting P(label = true).
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    /// Fit on the rows of `features` selected by `indices` (duplicates allowed,
    /// which is how bootstrap samples arrive).
    pub fn fit(features: &[Vec<f64>], labels: &[bool], indices: &[usize], config: &TreeConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let root = build(features, labels, indices, 0, config, &mut rng);
        Self { root }
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { prob_up } => return *prob_up,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

fn build(
    features: &[Vec<f64>],
    labels: &[bool],
    indices: &[usize],
    depth: usize,
    config: &TreeConfig,
    rng: &mut StdRng,
) -> Node {
    let n = indices.len();
    let positives = indices.iter().filter(|&&i| labels[i]).count();
    let leaf = Node::Leaf {
        prob_up: if n == 0 { 0.5 } else { positives as f64 / n as f64 },
    };

    if depth >= config.max_depth
        || n < config.min_samples_split
        || positives == 0
        || positives == n
    {
        return leaf;
    }

    match best_split(features, labels, indices, positives, config, rng) {
        Some(split) => Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(build(features, labels, &split.left, depth + 1, config, rng)),
            right: Box::new(build(features, labels, &split.right, depth + 1, config, rng)),
        },
        None => leaf,
    }
}

fn best_split(
    features: &[Vec<f64>],
    labels: &[bool],
    indices: &[usize],
    positives: usize,
    config: &TreeConfig,
    rng: &mut StdRng,
) -> Option<BestSplit> {
    let n = indices.len();
    let n_features = features.first().map_or(0, Vec::len);
    let mut candidates: Vec<usize> = (0..n_features).collect();
    candidates.shuffle(rng);
    candidates.truncate(config.max_features.unwrap_or(n_features).max(1));

    let parent = gini(positives, n);
    let mut best: Option<(f64, usize, f64)> = None;

    for &feature in &candidates {
        let mut order = indices.to_vec();
        order.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let mut left_pos = 0usize;
        for k in 1..n {
            if labels[order[k - 1]] {
                left_pos += 1;
            }
            let lo = features[order[k - 1]][feature];
            let hi = features[order[k]][feature];
            if lo == hi || k < config.min_samples_leaf || n - k < config.min_samples_leaf {
                continue;
            }
            let weighted = (k as f64 * gini(left_pos, k)
                + (n - k) as f64 * gini(positives - left_pos, n - k))
                / n as f64;
            let gain = parent - weighted;
            if gain > 1e-12 && best.map_or(true, |(g, _, _)| gain > g) {
                best = Some((gain, feature, (lo + hi) / 2.0));
            }
        }
    }

    let (_, feature, threshold) = best?;
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| features[i][feature] <= threshold);
    Some(BestSplit {
        feature,
        threshold,
        left,
        right,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separable_data_is_learned() {
        let features: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, 0.0]).collect();
        let labels: Vec<bool> = (0..40).map(|i| i >= 20).collect();
        let indices: Vec<usize> = (0..40).collect();
        let tree = DecisionTree::fit(&features, &labels, &indices, &TreeConfig::default());

        assert!(tree.predict_proba(&[5.0, 0.0]) < 0.01);
        assert!(tree.predict_proba(&[35.0, 0.0]) > 0.99);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn pure_node_is_a_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let labels = vec![true, true, true];
        let tree = DecisionTree::fit(&features, &labels, &[0, 1, 2], &TreeConfig::default());
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_proba(&[10.0]), 1.0);
    }
}
