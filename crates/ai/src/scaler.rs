use serde::{Deserialize, Serialize};

use crate::result::{AiResult, check_matrix, check_width};
use crate::stats;

/// Per-feature standardization (zero mean, unit population variance).
///
/// Fitted once on training rows and never refitted. A constant column keeps a
/// scale of 1 so it maps to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: &[Vec<f64>]) -> AiResult<Self> {
        let width = check_matrix(x)?;
        let mut mean = Vec::with_capacity(width);
        let mut scale = Vec::with_capacity(width);
        for j in 0..width {
            let column: Vec<f64> = x.iter().map(|row| row[j]).collect();
            let sd = stats::std_dev(&column);
            mean.push(stats::mean(&column));
            scale.push(if sd > f64::EPSILON { sd } else { 1.0 });
        }
        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform_row(&self, row: &[f64]) -> AiResult<Vec<f64>> {
        check_width(self.n_features(), row)?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn transform(&self, x: &[Vec<f64>]) -> AiResult<Vec<Vec<f64>>> {
        x.iter().map(|row| self.transform_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::AiError;

    #[test]
    fn standardizes_columns() {
        let x = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        assert_eq!(scaler.mean(), &[2.0, 10.0]);
        assert_eq!(scaler.scale(), &[1.0, 1.0]);
        assert_eq!(scaler.transform_row(&[3.0, 10.0]).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn rejects_wrong_width() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0]]).unwrap();
        assert_eq!(
            scaler.transform_row(&[1.0]),
            Err(AiError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }
}
