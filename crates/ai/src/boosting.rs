//! Least-squares gradient boosting over regression trees.

use serde::{Deserialize, Serialize};

use crate::model::Regressor;
use crate::result::{AiError, AiResult, check_matrix, check_width};
use crate::stats;
use crate::tree::{RegressionTree, TreeParams, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub tree: TreeParams,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            tree: TreeParams {
                max_depth: 8,
                min_samples_split: 5,
                min_samples_leaf: 2,
            },
        }
    }
}

/// Stage-wise additive model: starts from the target mean and fits each
/// tree to the current residuals, shrunk by the learning rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    n_features: usize,
    init: f64,
    learning_rate: f64,
    stages: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: BoostingParams) -> AiResult<Self> {
        let n_features = check_matrix(x)?;
        if x.len() != y.len() {
            return Err(AiError::invalid(format!(
                "{} rows but {} targets",
                x.len(),
                y.len()
            )));
        }
        let lr = params.learning_rate;
        if lr.is_nan() || lr <= 0.0 || lr > 1.0 {
            return Err(AiError::invalid(format!(
                "learning rate must be in (0, 1], got {}",
                params.learning_rate
            )));
        }

        let init = stats::mean(y);
        let mut current = vec![init; y.len()];
        let mut stages = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, p)| t - p).collect();
            let tree = RegressionTree::fit(x, &residuals, params.tree)?;
            for (row, p) in x.iter().zip(current.iter_mut()) {
                *p += params.learning_rate * tree.predict_row(row)?;
            }
            stages.push(tree);
        }

        Ok(Self {
            n_features,
            init,
            learning_rate: params.learning_rate,
            stages,
        })
    }

    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn feature_importances(&self) -> Vec<f64> {
        let mut acc = vec![0.0; self.n_features];
        for tree in &self.stages {
            for (a, v) in acc.iter_mut().zip(tree.feature_importances()) {
                *a += v;
            }
        }
        normalize(&acc)
    }
}

impl Regressor for GradientBoostingRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: &[f64]) -> AiResult<f64> {
        check_width(self.n_features, row)?;
        let mut out = self.init;
        for tree in &self.stages {
            out += self.learning_rate * tree.predict_row(row)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::r2_score;

    #[test]
    fn fits_a_nonlinear_signal() {
        let x: Vec<Vec<f64>> = (0..150).map(|i| vec![i as f64 / 10.0]).collect();
        let y: Vec<f64> = x.iter().map(|r| (r[0]).sin() * 10.0 + r[0]).collect();
        let params = BoostingParams {
            n_estimators: 50,
            ..BoostingParams::default()
        };
        let model = GradientBoostingRegressor::fit(&x, &y, params).unwrap();
        assert_eq!(model.n_stages(), 50);
        let pred = model.predict(&x).unwrap();
        assert!(r2_score(&y, &pred) > 0.95);
    }

    #[test]
    fn zero_stages_predicts_the_mean() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0]];
        let params = BoostingParams {
            n_estimators: 0,
            ..BoostingParams::default()
        };
        let model = GradientBoostingRegressor::fit(&x, &[1.0, 2.0, 6.0], params).unwrap();
        assert_eq!(model.predict_row(&[10.0]).unwrap(), 3.0);
        assert_eq!(model.feature_importances(), vec![0.0]);
    }

    #[test]
    fn rejects_bad_learning_rate() {
        let params = BoostingParams {
            learning_rate: 0.0,
            ..BoostingParams::default()
        };
        assert!(GradientBoostingRegressor::fit(&[vec![1.0]], &[1.0], params).is_err());
    }
}
