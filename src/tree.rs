//! Decision tree classification
//!
//! Array-based CART trees with deterministic training and leaf-probability
//! inference. Trees are grown with a weighted Gini criterion over a random
//! feature subset per split; all randomness comes from the caller's seeded
//! RNG, so identical seeds grow identical trees.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::seq::index;

/// Sentinel feature index marking a leaf node.
const LEAF_FEATURE: i32 = -2;

/// Minimum impurity decrease for a split to be kept.
const MIN_GAIN: f64 = 1e-12;

/// A node in the decision tree.
///
/// Every node carries the class distribution of the training samples that
/// reached it; for leaves this is the prediction.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Feature index to split on (`-2` for leaf nodes).
    pub feature: i32,
    /// Split threshold (features <= threshold go left).
    pub threshold: f64,
    /// Index of left child (`-1` for leaf).
    pub left: i32,
    /// Index of right child (`-1` for leaf).
    pub right: i32,
    /// Class probability distribution at this node.
    pub distribution: Vec<f64>,
}

impl TreeNode {
    /// Returns `true` if this node is a leaf (no children).
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.feature < 0
    }
}

/// Growth limits and split sampling for one tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    /// Number of candidate features sampled per split.
    pub max_features: usize,
    pub min_samples_split: usize,
}

/// A CART decision tree classifier.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    n_classes: usize,
    /// Per-feature mean-decrease-in-impurity, normalized to sum to one.
    importance: Vec<f64>,
}

impl DecisionTree {
    /// Grow a tree on `(x, y)` with per-sample weights.
    ///
    /// `x` rows must all have `n_features` values and `y` labels must be
    /// `< n_classes`; the classifier guarantees both by construction.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        sample_weight: &[f64],
        n_features: usize,
        n_classes: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
            n_classes,
            importance: vec![0.0; n_features],
        };

        let indices: Vec<usize> = (0..x.len()).collect();
        let total_weight: f64 = indices.iter().map(|&i| sample_weight[i]).sum();
        tree.grow(x, y, sample_weight, indices, 0, params, total_weight, rng);

        let importance_sum: f64 = tree.importance.iter().sum();
        if importance_sum > 0.0 {
            for value in &mut tree.importance {
                *value /= importance_sum;
            }
        }

        tree
    }

    /// Recursively grow the subtree for `indices`, returning its node index.
    #[allow(clippy::too_many_arguments)]
    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[usize],
        sample_weight: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        total_weight: f64,
        rng: &mut StdRng,
    ) -> i32 {
        let (counts, node_weight) = self.weighted_counts(y, sample_weight, &indices);
        let node_gini = gini(&counts, node_weight);
        let distribution = normalize(&counts, node_weight);

        let at_depth_limit = depth >= params.max_depth;
        let too_small = indices.len() < params.min_samples_split;
        let split = if at_depth_limit || too_small || node_gini <= 0.0 {
            None
        } else {
            self.best_split(x, y, sample_weight, &indices, &counts, node_weight, node_gini, params, rng)
        };

        let Some(split) = split else {
            self.nodes.push(TreeNode {
                feature: LEAF_FEATURE,
                threshold: LEAF_FEATURE as f64,
                left: -1,
                right: -1,
                distribution,
            });
            return (self.nodes.len() - 1) as i32;
        };

        self.importance[split.feature] += (node_weight / total_weight) * split.gain;

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let node_index = self.nodes.len();
        self.nodes.push(TreeNode {
            feature: split.feature as i32,
            threshold: split.threshold,
            left: -1,
            right: -1,
            distribution,
        });

        let left = self.grow(x, y, sample_weight, left_indices, depth + 1, params, total_weight, rng);
        let right = self.grow(x, y, sample_weight, right_indices, depth + 1, params, total_weight, rng);
        self.nodes[node_index].left = left;
        self.nodes[node_index].right = right;

        node_index as i32
    }

    /// Search a random feature subset for the split with the largest
    /// weighted Gini decrease. First strictly-better candidate wins, so the
    /// outcome is deterministic under a fixed RNG.
    #[allow(clippy::too_many_arguments)]
    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[usize],
        sample_weight: &[f64],
        indices: &[usize],
        counts: &[f64],
        node_weight: f64,
        node_gini: f64,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Option<Split> {
        let n_candidates = params.max_features.clamp(1, self.n_features);
        let candidates = index::sample(rng, self.n_features, n_candidates);

        let mut best: Option<Split> = None;

        for feature in candidates.iter() {
            let mut order = indices.to_vec();
            order.sort_by(|&a, &b| {
                x[a][feature]
                    .partial_cmp(&x[b][feature])
                    .unwrap_or(Ordering::Equal)
            });

            let mut left_counts = vec![0.0; self.n_classes];
            let mut left_weight = 0.0;

            for window in 0..order.len().saturating_sub(1) {
                let i = order[window];
                left_counts[y[i]] += sample_weight[i];
                left_weight += sample_weight[i];

                let value = x[i][feature];
                let next_value = x[order[window + 1]][feature];
                if next_value <= value {
                    continue;
                }

                let right_weight = node_weight - left_weight;
                if left_weight <= 0.0 || right_weight <= 0.0 {
                    continue;
                }

                let right_counts: Vec<f64> = counts
                    .iter()
                    .zip(&left_counts)
                    .map(|(total, left)| total - left)
                    .collect();

                let gain = node_gini
                    - (left_weight / node_weight) * gini(&left_counts, left_weight)
                    - (right_weight / node_weight) * gini(&right_counts, right_weight);

                if gain > best.as_ref().map_or(MIN_GAIN, |b| b.gain) {
                    best = Some(Split {
                        feature,
                        threshold: (value + next_value) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }

    fn weighted_counts(
        &self,
        y: &[usize],
        sample_weight: &[f64],
        indices: &[usize],
    ) -> (Vec<f64>, f64) {
        let mut counts = vec![0.0; self.n_classes];
        let mut weight = 0.0;
        for &i in indices {
            counts[y[i]] += sample_weight[i];
            weight += sample_weight[i];
        }
        (counts, weight)
    }

    /// Class probability distribution for a single sample.
    ///
    /// Traverses from root to leaf; missing feature values read as 0.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return &node.distribution;
            }
            let value = features.get(node.feature as usize).copied().unwrap_or(0.0);
            idx = if value <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    /// Classify a single sample: argmax of the leaf distribution, ties
    /// broken by the lowest class index.
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(self.predict_proba(features))
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Expected number of features.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of output classes.
    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Normalized per-feature impurity-decrease importances.
    #[must_use]
    pub fn feature_importance(&self) -> &[f64] {
        &self.importance
    }

    /// Tree depth (longest root-to-leaf path).
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.node_depth(0)
    }

    #[allow(clippy::cast_sign_loss)]
    fn node_depth(&self, idx: usize) -> usize {
        let node = &self.nodes[idx];
        if node.is_leaf() {
            return 0;
        }
        let left = self.node_depth(node.left as usize);
        let right = self.node_depth(node.right as usize);
        1 + left.max(right)
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Weighted Gini impurity: 1 - sum of squared class shares.
fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c / total;
            p * p
        })
        .sum::<f64>()
}

fn normalize(counts: &[f64], total: f64) -> Vec<f64> {
    if total <= 0.0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c / total).collect()
}

/// Index of the largest value; the first maximum wins on ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }
    best
}
