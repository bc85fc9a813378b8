//! CART regression tree (variance reduction, exhaustive threshold search).

use serde::{Deserialize, Serialize};

use crate::model::Regressor;
use crate::result::{AiError, AiResult, check_width};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 15,
            min_samples_split: 5,
            min_samples_leaf: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    n_features: usize,
    nodes: Vec<Node>,
    /// Unnormalized squared-error decrease per feature.
    #[serde(default)]
    impurity_decrease: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    /// Fit on the rows of `x` listed in `sample` (duplicates allowed, which is
    /// how bootstrap resamples are passed in).
    pub fn fit_indices(
        x: &[Vec<f64>],
        y: &[f64],
        sample: &[usize],
        params: TreeParams,
    ) -> AiResult<Self> {
        if sample.is_empty() {
            return Err(AiError::invalid("cannot fit a tree on zero rows"));
        }
        if params.min_samples_leaf == 0 {
            return Err(AiError::invalid("min_samples_leaf must be at least 1"));
        }
        let n_features = x[sample[0]].len();
        let mut tree = Self {
            n_features,
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; n_features],
        };
        let mut idx = sample.to_vec();
        tree.grow(x, y, &mut idx, 0, params);
        Ok(tree)
    }

    pub fn fit(x: &[Vec<f64>], y: &[f64], params: TreeParams) -> AiResult<Self> {
        if x.len() != y.len() {
            return Err(AiError::invalid(format!(
                "{} rows but {} targets",
                x.len(),
                y.len()
            )));
        }
        let all: Vec<usize> = (0..x.len()).collect();
        Self::fit_indices(x, y, &all, params)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Importances normalized to sum to 1 (all zero for a single-leaf tree).
    pub fn feature_importances(&self) -> Vec<f64> {
        normalize(&self.impurity_decrease)
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        idx: &mut [usize],
        depth: usize,
        params: TreeParams,
    ) -> usize {
        let n = idx.len() as f64;
        let sum: f64 = idx.iter().map(|&i| y[i]).sum();
        let sum_sq: f64 = idx.iter().map(|&i| y[i] * y[i]).sum();
        let mean = sum / n;
        let sse = (sum_sq - sum * sum / n).max(0.0);

        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= params.max_depth
            || idx.len() < params.min_samples_split
            || idx.len() < 2 * params.min_samples_leaf
            || sse <= f64::EPSILON * (1.0 + sum_sq)
        {
            return slot;
        }

        let Some(best) = self.best_split(x, y, idx, params.min_samples_leaf) else {
            return slot;
        };
        if best.sse >= sse {
            return slot;
        }
        self.impurity_decrease[best.feature] += sse - best.sse;

        let pivot = partition(idx, |&i| x[i][best.feature] <= best.threshold);
        let (left_idx, right_idx) = idx.split_at_mut(pivot);
        let left = self.grow(x, y, left_idx, depth + 1, params);
        let right = self.grow(x, y, right_idx, depth + 1, params);
        self.nodes[slot] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        slot
    }

    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        idx: &[usize],
        min_leaf: usize,
    ) -> Option<BestSplit> {
        let n = idx.len();
        let total: f64 = idx.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = idx.iter().map(|&i| y[i] * y[i]).sum();
        let mut best: Option<BestSplit> = None;
        let mut order = idx.to_vec();

        for feature in 0..self.n_features {
            order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 0..n - 1 {
                let yi = y[order[pos]];
                left_sum += yi;
                left_sq += yi * yi;

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let here = x[order[pos]][feature];
                let next = x[order[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);
                if best.as_ref().is_none_or(|b| sse < b.sse) {
                    best = Some(BestSplit {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        sse: sse.max(0.0),
                    });
                }
            }
        }
        best
    }
}

impl Regressor for RegressionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: &[f64]) -> AiResult<f64> {
        check_width(self.n_features, row)?;
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// In-place partition; returns the count of elements satisfying `pred`, which
/// end up at the front.
fn partition<T, F: Fn(&T) -> bool>(items: &mut [T], pred: F) -> usize {
    let mut store = 0;
    for i in 0..items.len() {
        if pred(&items[i]) {
            items.swap(i, store);
            store += 1;
        }
    }
    store
}

pub(crate) fn normalize(raw: &[f64]) -> Vec<f64> {
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return vec![0.0; raw.len()];
    }
    raw.iter().map(|v| v / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learns_a_step_function() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 0.0]).collect();
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { 5.0 }).collect();
        let tree = RegressionTree::fit(&x, &y, TreeParams::default()).unwrap();

        assert_eq!(tree.predict_row(&[3.0, 0.0]).unwrap(), 1.0);
        assert_eq!(tree.predict_row(&[15.0, 0.0]).unwrap(), 5.0);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.feature_importances(), vec![1.0, 0.0]);
    }

    #[test]
    fn respects_min_samples_leaf() {
        let x: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64]).collect();
        let y = vec![0.0, 0.0, 0.0, 0.0, 0.0, 100.0];
        let params = TreeParams {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 2,
        };
        let tree = RegressionTree::fit(&x, &y, params).unwrap();
        // The outlier cannot be isolated in a leaf of one.
        assert_eq!(tree.predict_row(&[5.0]).unwrap(), 50.0);
    }

    #[test]
    fn constant_target_is_a_single_leaf() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let tree = RegressionTree::fit(&x, &[3.0; 10], TreeParams::default()).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.feature_importances(), vec![0.0]);
    }

    #[test]
    fn max_depth_zero_predicts_the_mean() {
        let x = vec![vec![0.0], vec![1.0]];
        let params = TreeParams {
            max_depth: 0,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&x, &[2.0, 4.0], params).unwrap();
        assert_eq!(tree.predict_row(&[1.0]).unwrap(), 3.0);
    }
}
