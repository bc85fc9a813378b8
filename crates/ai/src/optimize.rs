//! Derivative-free minimization (Nelder–Mead simplex).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadOptions {
    pub max_iter: usize,
    /// Stop when every vertex is within this distance of the best one.
    pub x_tol: f64,
    /// Stop when the objective spread across vertices is below this.
    pub f_tol: f64,
    /// Initial simplex edge for zero coordinates.
    pub initial_step: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iter: 2_000,
            x_tol: 1e-7,
            f_tol: 1e-9,
            initial_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimize `f` starting from `x0`.
///
/// `f` may return `f64::INFINITY` to mark infeasible points; the simplex then
/// contracts away from them. `x0` itself should be feasible.
pub fn nelder_mead<F: Fn(&[f64]) -> f64>(f: F, x0: &[f64], opts: NelderMeadOptions) -> Minimum {
    let dim = x0.len();
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dim + 1);
    simplex.push((x0.to_vec(), f(x0)));
    for i in 0..dim {
        let mut v = x0.to_vec();
        v[i] = if v[i] == 0.0 {
            opts.initial_step
        } else {
            v[i] * 1.05
        };
        let fv = f(&v);
        simplex.push((v, fv));
    }

    let mut iterations = 0;
    let mut converged = false;
    while iterations < opts.max_iter {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let best = simplex[0].1;
        let worst = simplex[dim].1;
        let spread = (worst - best).abs();
        let size = simplex[1..]
            .iter()
            .map(|(v, _)| {
                v.iter()
                    .zip(&simplex[0].0)
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0, f64::max)
            })
            .fold(0.0, f64::max);
        if best.is_finite() && spread <= opts.f_tol * (1.0 + best.abs()) && size <= opts.x_tol {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..dim)
            .map(|j| simplex[..dim].iter().map(|(v, _)| v[j]).sum::<f64>() / dim as f64)
            .collect();
        let along = |t: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&simplex[dim].0)
                .map(|(c, w)| c + t * (w - c))
                .collect()
        };

        let reflected = along(-1.0);
        let fr = f(&reflected);
        if fr < simplex[0].1 {
            let expanded = along(-2.0);
            let fe = f(&expanded);
            simplex[dim] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
            continue;
        }
        if fr < simplex[dim - 1].1 {
            simplex[dim] = (reflected, fr);
            continue;
        }

        let (contracted, fc) = if fr < worst {
            let c = along(-0.5);
            let fc = f(&c);
            (c, fc)
        } else {
            let c = along(0.5);
            let fc = f(&c);
            (c, fc)
        };
        if fc < worst.min(fr) {
            simplex[dim] = (contracted, fc);
            continue;
        }

        // Shrink toward the best vertex.
        let anchor = simplex[0].0.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let v: Vec<f64> = anchor
                .iter()
                .zip(&vertex.0)
                .map(|(a, b)| a + 0.5 * (b - a))
                .collect();
            let fv = f(&v);
            *vertex = (v, fv);
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (x, value) = simplex.swap_remove(0);
    Minimum {
        x,
        value,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_rosenbrock() {
        let rosen = |p: &[f64]| (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2);
        let m = nelder_mead(rosen, &[-1.2, 1.0], NelderMeadOptions::default());
        assert!(m.converged);
        assert!((m.x[0] - 1.0).abs() < 1e-3, "{:?}", m.x);
        assert!((m.x[1] - 1.0).abs() < 1e-3, "{:?}", m.x);
    }

    #[test]
    fn stays_inside_a_feasible_region() {
        // Minimum at 2 but infeasible beyond 1.
        let f = |p: &[f64]| {
            if p[0] > 1.0 {
                f64::INFINITY
            } else {
                (p[0] - 2.0).powi(2)
            }
        };
        let m = nelder_mead(f, &[0.0], NelderMeadOptions::default());
        assert!(m.x[0] <= 1.0 && m.x[0] > 0.99, "{:?}", m.x);
    }
}
