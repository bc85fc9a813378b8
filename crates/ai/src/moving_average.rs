//! Trailing-window mean forecaster.
//!
//! Used when a model-based fit is not possible. It only needs one observation
//! and never fails on a non-empty series.

use crate::forecast::{SeriesForecast, Z_95};
use crate::result::{AiError, AiResult};
use crate::stats;

#[derive(Debug, Clone, Copy)]
pub struct MovingAverageForecaster {
    /// Trailing observations averaged into the flat forecast.
    window: usize,
}

impl Default for MovingAverageForecaster {
    fn default() -> Self {
        Self { window: 30 }
    }
}

impl MovingAverageForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Flat forecast at the trailing mean, banded by ±1.96 trailing std.
    ///
    /// MAE is reported as the trailing std; MAPE as that std relative to the
    /// mean of the whole series (0 when the series mean is 0).
    pub fn forecast(&self, series: &[f64], horizon: usize) -> AiResult<SeriesForecast> {
        if series.is_empty() {
            return Err(AiError::invalid("cannot forecast an empty series"));
        }
        let tail = &series[series.len().saturating_sub(self.window)..];
        let level = stats::mean(tail);
        let std = stats::std_dev(tail);
        let overall = stats::mean(series);

        Ok(SeriesForecast {
            mean: vec![level; horizon],
            lower: vec![level - Z_95 * std; horizon],
            upper: vec![level + Z_95 * std; horizon],
            mae: std,
            mape: if overall == 0.0 { 0.0 } else { std / overall * 100.0 },
        })
    }
}
