//! L2-regularized binary logistic regression fitted by Newton's method.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::linalg;
use crate::result::{AiError, AiResult, check_matrix, check_width};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Reweight classes inversely to their frequency.
    pub balanced: bool,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            balanced: true,
        }
    }
}

/// Minimizes `0.5·‖w‖² + C·Σ sᵢ·logloss(yᵢ, σ(w·xᵢ + b))` where `sᵢ` is the
/// class weight of row i. The intercept is not penalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable `log(1 + e^z)`.
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

struct Problem<'a> {
    x: &'a [Vec<f64>],
    y: &'a [bool],
    weights: Vec<f64>,
    c: f64,
}

impl Problem<'_> {
    fn margin(&self, theta: &[f64], row: &[f64]) -> f64 {
        let (w, b) = theta.split_at(theta.len() - 1);
        row.iter().zip(w).map(|(x, w)| x * w).sum::<f64>() + b[0]
    }

    fn objective(&self, theta: &[f64]) -> f64 {
        let (w, _) = theta.split_at(theta.len() - 1);
        let penalty = 0.5 * w.iter().map(|v| v * v).sum::<f64>();
        let loss: f64 = self
            .x
            .iter()
            .zip(self.y)
            .zip(&self.weights)
            .map(|((row, &yi), s)| {
                let z = self.margin(theta, row);
                // -log σ(z) for positives, -log(1-σ(z)) for negatives.
                s * if yi { softplus(-z) } else { softplus(z) }
            })
            .sum();
        penalty + self.c * loss
    }

    fn gradient_and_hessian(&self, theta: &[f64]) -> (Vec<f64>, Vec<Vec<f64>>) {
        let dim = theta.len();
        let mut grad = vec![0.0; dim];
        let mut hess = vec![vec![0.0; dim]; dim];

        for ((row, &yi), s) in self.x.iter().zip(self.y).zip(&self.weights) {
            let p = sigmoid(self.margin(theta, row));
            let g = self.c * s * (p - if yi { 1.0 } else { 0.0 });
            let h = self.c * s * p * (1.0 - p);
            for i in 0..dim {
                let xi = if i + 1 == dim { 1.0 } else { row[i] };
                grad[i] += g * xi;
                for j in 0..=i {
                    let xj = if j + 1 == dim { 1.0 } else { row[j] };
                    hess[i][j] += h * xi * xj;
                }
            }
        }
        for i in 0..dim {
            for j in 0..i {
                hess[j][i] = hess[i][j];
            }
        }
        for i in 0..dim - 1 {
            grad[i] += theta[i];
            hess[i][i] += 1.0;
        }
        (grad, hess)
    }
}

/// Balanced class weights: `n / (2 · n_class)`.
pub fn balanced_weights(y: &[bool]) -> AiResult<(f64, f64)> {
    let n = y.len() as f64;
    let pos = y.iter().filter(|&&v| v).count() as f64;
    let neg = n - pos;
    if pos == 0.0 || neg == 0.0 {
        return Err(AiError::invalid("both classes must be present"));
    }
    Ok((n / (2.0 * neg), n / (2.0 * pos)))
}

impl LogisticRegression {
    pub fn fit(x: &[Vec<f64>], y: &[bool], params: LogisticParams) -> AiResult<Self> {
        let width = check_matrix(x)?;
        if x.len() != y.len() {
            return Err(AiError::invalid(format!("{} rows but {} labels", x.len(), y.len())));
        }
        if params.c.is_nan() || params.c <= 0.0 {
            return Err(AiError::invalid("C must be positive"));
        }

        let (w_neg, w_pos) = if params.balanced {
            balanced_weights(y)?
        } else {
            (1.0, 1.0)
        };
        let problem = Problem {
            x,
            y,
            weights: y.iter().map(|&v| if v { w_pos } else { w_neg }).collect(),
            c: params.c,
        };

        let mut theta = vec![0.0; width + 1];
        let mut value = problem.objective(&theta);
        for iter in 0..params.max_iter {
            let (grad, hess) = problem.gradient_and_hessian(&theta);
            let step = linalg::solve(hess, grad)?;

            // Backtracking keeps every accepted step a descent step.
            let mut t = 1.0;
            let mut accepted = None;
            while t > 1e-10 {
                let candidate: Vec<f64> = theta.iter().zip(&step).map(|(a, d)| a - t * d).collect();
                let cv = problem.objective(&candidate);
                if cv.is_finite() && cv <= value {
                    accepted = Some((candidate, cv));
                    break;
                }
                t *= 0.5;
            }
            let Some((next, next_value)) = accepted else {
                debug!(iter, "logistic line search stalled");
                break;
            };

            let moved = step.iter().map(|d| (t * d).abs()).fold(0.0, f64::max);
            theta = next;
            value = next_value;
            if moved < 1e-8 {
                debug!(iter, objective = value, "logistic regression converged");
                break;
            }
        }

        if theta.iter().any(|v| !v.is_finite()) {
            return Err(AiError::fit_failed("non-finite coefficients"));
        }
        let intercept = theta[width];
        theta.truncate(width);
        Ok(Self {
            coefficients: theta,
            intercept,
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, row: &[f64]) -> AiResult<f64> {
        check_width(self.coefficients.len(), row)?;
        let z: f64 = row
            .iter()
            .zip(&self.coefficients)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + self.intercept;
        Ok(sigmoid(z))
    }

    pub fn predict(&self, row: &[f64]) -> AiResult<bool> {
        Ok(self.predict_proba(row)? >= 0.5)
    }
}
