//! Bagged regression trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::model::Regressor;
use crate::result::{AiError, AiResult, check_matrix, check_width};
use crate::stats;
use crate::tree::{RegressionTree, TreeParams, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub tree: TreeParams,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
            seed: 42,
        }
    }
}

/// Random forest regressor: each tree is grown on a bootstrap resample and
/// the prediction is the mean over trees. The per-tree predictions are
/// exposed so callers can derive an ensemble spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: ForestParams) -> AiResult<Self> {
        let n_features = check_matrix(x)?;
        if x.len() != y.len() {
            return Err(AiError::invalid(format!(
                "{} rows but {} targets",
                x.len(),
                y.len()
            )));
        }
        if params.n_estimators == 0 {
            return Err(AiError::invalid("forest needs at least one tree"));
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = x.len();
        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(RegressionTree::fit_indices(x, y, &sample, params.tree)?);
        }
        Ok(Self { n_features, trees })
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    /// One prediction per tree, in tree order.
    pub fn predict_each(&self, row: &[f64]) -> AiResult<Vec<f64>> {
        check_width(self.n_features, row)?;
        self.trees.iter().map(|t| t.predict_row(row)).collect()
    }

    /// Mean of per-tree normalized importances.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut acc = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (a, v) in acc.iter_mut().zip(tree.feature_importances()) {
                *a += v;
            }
        }
        normalize(&acc)
    }
}

impl Regressor for RandomForestRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: &[f64]) -> AiResult<f64> {
        Ok(stats::mean(&self.predict_each(row)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::r2_score;

    fn linear_data(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![i as f64, ((i * 7) % 13) as f64])
            .collect();
        let y = x.iter().map(|r| 3.0 * r[0] + 1.0).collect();
        (x, y)
    }

    fn small() -> ForestParams {
        ForestParams {
            n_estimators: 20,
            ..ForestParams::default()
        }
    }

    #[test]
    fn fits_a_linear_signal() {
        let (x, y) = linear_data(200);
        let forest = RandomForestRegressor::fit(&x, &y, small()).unwrap();
        let pred = forest.predict(&x).unwrap();
        assert!(r2_score(&y, &pred) > 0.95);

        let imp = forest.feature_importances();
        assert!(imp[0] > 0.9, "importances {imp:?}");
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mean_of_members_is_the_prediction() {
        let (x, y) = linear_data(50);
        let forest = RandomForestRegressor::fit(&x, &y, small()).unwrap();
        let each = forest.predict_each(&x[10]).unwrap();
        assert_eq!(each.len(), 20);
        assert_eq!(forest.predict_row(&x[10]).unwrap(), stats::mean(&each));
    }

    #[test]
    fn seeded_fit_is_reproducible() {
        let (x, y) = linear_data(60);
        let a = RandomForestRegressor::fit(&x, &y, small()).unwrap();
        let b = RandomForestRegressor::fit(&x, &y, small()).unwrap();
        assert_eq!(a, b);
    }
}
