//! ARIMA(2,1,2) fitted by conditional sum of squares.
//!
//! The series is differenced once, then an ARMA(2,2) without constant is fitted
//! to the differences:
//!
//! ```text
//! w[t] = φ1·w[t-1] + φ2·w[t-2] + e[t] + θ1·e[t-1] + θ2·e[t-2]
//! ```
//!
//! Pre-sample residuals are zero. Parameters outside the stationary
//! (AR) or invertible (MA) triangle score an infinite loss, so the optimizer
//! only returns admissible models.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::forecast::{SeriesForecast, Z_95};
use crate::optimize::{NelderMeadOptions, nelder_mead};
use crate::result::{AiError, AiResult};
use crate::stats;

/// Fewest observations accepted for a fit.
pub const MIN_OBSERVATIONS: usize = 10;

/// Human-readable order, as reported in model metadata.
pub const ARIMA_LABEL: &str = "ARIMA(2,1,2)";

const STABILITY_MARGIN: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arima {
    ar: [f64; 2],
    ma: [f64; 2],
    sigma2: f64,
    /// Last two differences and residuals, newest last.
    w_tail: [f64; 2],
    e_tail: [f64; 2],
    last_level: f64,
    mae: f64,
    mape: f64,
}

/// `1 - a1·z - a2·z²` has all roots outside the unit circle.
fn in_stability_triangle(a1: f64, a2: f64) -> bool {
    a1 + a2 < 1.0 - STABILITY_MARGIN
        && a2 - a1 < 1.0 - STABILITY_MARGIN
        && a2.abs() < 1.0 - STABILITY_MARGIN
}

fn admissible(p: &[f64]) -> bool {
    in_stability_triangle(p[0], p[1]) && in_stability_triangle(-p[2], -p[3])
}

/// Residuals of the differenced series for parameters `[φ1, φ2, θ1, θ2]`,
/// starting at index 2.
fn residuals(w: &[f64], p: &[f64]) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in 2..w.len() {
        e[t] = w[t] - p[0] * w[t - 1] - p[1] * w[t - 2] - p[2] * e[t - 1] - p[3] * e[t - 2];
    }
    e.split_off(2)
}

fn css(w: &[f64], p: &[f64]) -> f64 {
    if !admissible(p) {
        return f64::INFINITY;
    }
    let sse: f64 = residuals(w, p).iter().map(|e| e * e).sum();
    if sse.is_finite() { sse } else { f64::INFINITY }
}

impl Arima {
    pub fn fit(series: &[f64]) -> AiResult<Self> {
        if series.len() < MIN_OBSERVATIONS {
            return Err(AiError::fit_failed(format!(
                "need at least {MIN_OBSERVATIONS} observations, got {}",
                series.len()
            )));
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AiError::fit_failed("series contains non-finite values"));
        }

        let w: Vec<f64> = series.windows(2).map(|p| p[1] - p[0]).collect();
        if stats::variance(&w) < 1e-12 {
            return Err(AiError::fit_failed("differenced series has zero variance"));
        }

        let min = nelder_mead(|p| css(&w, p), &[0.0; 4], NelderMeadOptions::default());
        if !min.value.is_finite() || !admissible(&min.x) {
            return Err(AiError::fit_failed("no admissible parameters found"));
        }
        debug!(
            iterations = min.iterations,
            converged = min.converged,
            css = min.value,
            "arima fit finished"
        );

        let e = residuals(&w, &min.x);
        let sigma2 = min.value / e.len() as f64;
        // e[k] is the one-step error on level series[k + 3].
        let mae = e.iter().map(|v| v.abs()).sum::<f64>() / e.len() as f64;
        let mape = e
            .iter()
            .zip(&series[3..])
            .map(|(err, y)| (err / (y + 1.0)).abs())
            .sum::<f64>()
            / e.len() as f64
            * 100.0;

        let m = w.len();
        let k = e.len();
        Ok(Self {
            ar: [min.x[0], min.x[1]],
            ma: [min.x[2], min.x[3]],
            sigma2,
            w_tail: [w[m - 2], w[m - 1]],
            e_tail: [e[k.saturating_sub(2)], e[k - 1]],
            last_level: series[series.len() - 1],
            mae,
            mape,
        })
    }

    pub fn ar(&self) -> [f64; 2] {
        self.ar
    }

    pub fn ma(&self) -> [f64; 2] {
        self.ma
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Recursive multi-step forecast of the level series with 95% bands.
    pub fn forecast(&self, horizon: usize) -> SeriesForecast {
        let [phi1, phi2] = self.ar;
        let [theta1, theta2] = self.ma;

        let mut w = self.w_tail.to_vec();
        let mut e = self.e_tail.to_vec();
        let mut level = self.last_level;
        let mut mean = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let n = w.len();
            let next = phi1 * w[n - 1] + phi2 * w[n - 2] + theta1 * e[n - 1] + theta2 * e[n - 2];
            w.push(next);
            e.push(0.0);
            level += next;
            mean.push(level);
        }

        // ψ-weights of the differenced process, accumulated for the level.
        let mut psi = vec![1.0];
        for j in 1..horizon {
            let theta = match j {
                1 => theta1,
                2 => theta2,
                _ => 0.0,
            };
            let prev2 = if j >= 2 { psi[j - 2] } else { 0.0 };
            psi.push(theta + phi1 * psi[j - 1] + phi2 * prev2);
        }
        let mut cumulative = 0.0;
        let mut variance = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (h, point) in mean.iter().enumerate() {
            cumulative += psi[h];
            variance += cumulative * cumulative;
            let half = Z_95 * (self.sigma2 * variance).sqrt();
            lower.push(point - half);
            upper.push(point + half);
        }

        SeriesForecast {
            mean,
            lower,
            upper,
            mae: self.mae,
            mape: self.mape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Random walk with AR(1) increments.
    fn simulated(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut level = 100.0;
        let mut w = 0.0;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let shock: f64 = rng.r#gen::<f64>() - 0.5;
            w = phi * w + shock;
            level += w;
            out.push(level);
        }
        out
    }

    #[test]
    fn recovers_ar_dynamics() {
        let series = simulated(600, 0.6, 11);
        let model = Arima::fit(&series).unwrap();
        let [phi1, _] = model.ar();
        let [theta1, _] = model.ma();
        // AR and MA terms can trade off; the first-lag sum reflects φ.
        assert!((phi1 + theta1 - 0.6).abs() < 0.25, "φ1={phi1}, θ1={theta1}");
        assert!(admissible(&[model.ar[0], model.ar[1], model.ma[0], model.ma[1]]));
    }

    #[test]
    fn forecast_has_requested_horizon_and_widening_bands() {
        let series = simulated(200, 0.3, 5);
        let f = Arima::fit(&series).unwrap().forecast(30);
        assert_eq!(f.horizon(), 30);
        assert_eq!(f.lower.len(), 30);
        let width = |i: usize| f.upper[i] - f.lower[i];
        assert!(width(29) > width(0));
        assert!(f.mean.iter().zip(&f.lower).all(|(m, l)| l <= m));
    }

    #[test]
    fn degenerate_series_fail_to_fit() {
        assert!(matches!(Arima::fit(&[0.0; 100]), Err(AiError::FitFailed(_))));
        assert!(matches!(Arima::fit(&[1.0, 2.0, 3.0]), Err(AiError::FitFailed(_))));
        let linear: Vec<f64> = (0..50).map(|i| i as f64 * 2.0).collect();
        assert!(Arima::fit(&linear).is_err());
        let mut bad = simulated(50, 0.1, 1);
        bad[10] = f64::NAN;
        assert!(Arima::fit(&bad).is_err());
    }

    #[test]
    fn residual_order_is_bounded() {
        let w = [1.0, -1.0, 0.5, 0.25];
        assert_eq!(residuals(&w, &[0.0; 4]), vec![0.5, 0.25]);
        assert_eq!(css(&w, &[2.0, 0.0, 0.0, 0.0]), f64::INFINITY);
    }
}
