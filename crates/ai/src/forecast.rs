use serde::{Deserialize, Serialize};

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.96;

/// Point forecast with a 95% band and in-sample error summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesForecast {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub mae: f64,
    /// Percentage error, already multiplied by 100.
    pub mape: f64,
}

impl SeriesForecast {
    pub fn horizon(&self) -> usize {
        self.mean.len()
    }
}
