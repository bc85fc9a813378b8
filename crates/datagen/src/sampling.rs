//! Seeded sampling primitives shared by the generators.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Exp, Gamma, LogNormal, Poisson, StandardNormal};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatagenError {
    #[error("invalid {what} parameters: {reason}")]
    InvalidDistribution { what: &'static str, reason: String },

    #[error("unknown material id {0}")]
    UnknownMaterial(u32),
}

fn invalid<E: core::fmt::Display>(what: &'static str) -> impl FnOnce(E) -> DatagenError {
    move |e| DatagenError::InvalidDistribution {
        what,
        reason: e.to_string(),
    }
}

pub fn log_normal(mu: f64, sigma: f64) -> Result<LogNormal<f64>, DatagenError> {
    LogNormal::new(mu, sigma).map_err(invalid("log-normal"))
}

pub fn poisson(lambda: f64) -> Result<Poisson<f64>, DatagenError> {
    Poisson::new(lambda).map_err(invalid("poisson"))
}

pub fn beta(a: f64, b: f64) -> Result<Beta<f64>, DatagenError> {
    Beta::new(a, b).map_err(invalid("beta"))
}

/// Exponential distribution parameterized by its mean (`scale`).
pub fn exponential(scale: f64) -> Result<Exp<f64>, DatagenError> {
    Exp::new(1.0 / scale).map_err(invalid("exponential"))
}

pub fn gamma(shape: f64, scale: f64) -> Result<Gamma<f64>, DatagenError> {
    Gamma::new(shape, scale).map_err(invalid("gamma"))
}

/// Finite categorical distribution over a fixed value table.
#[derive(Debug, Clone)]
pub struct Categorical<T> {
    values: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T: Copy> Categorical<T> {
    pub fn new(values: &[T], weights: &[f64]) -> Result<Self, DatagenError> {
        if values.len() != weights.len() {
            return Err(DatagenError::InvalidDistribution {
                what: "categorical",
                reason: format!("{} values but {} weights", values.len(), weights.len()),
            });
        }
        let index = WeightedIndex::new(weights).map_err(invalid("categorical"))?;
        Ok(Self {
            values: values.to_vec(),
            index,
        })
    }

    pub fn uniform(values: &[T]) -> Result<Self, DatagenError> {
        Self::new(values, &vec![1.0; values.len()])
    }
}

/// Deterministic random source for one generator instance.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn draw<D: Distribution<f64>>(&mut self, dist: &D) -> f64 {
        dist.sample(&mut self.rng)
    }

    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + std_dev * z
    }

    /// Uniform draw in `[low, high)`; `low` must be below `high`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.rng.gen_range(low..high)
    }

    /// Bernoulli trial with success probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.r#gen::<f64>() < p
    }

    pub fn pick<T: Copy>(&mut self, table: &Categorical<T>) -> T {
        table.values[table.index.sample(&mut self.rng)]
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

pub fn clip(x: f64, low: f64, high: f64) -> f64 {
    x.max(low).min(high)
}

pub fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}

/// Clip, then truncate toward zero (integer-valued features).
pub fn clip_trunc(x: f64, low: f64, high: f64) -> u32 {
    clip(x, low, high).trunc() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Sampler::seeded(7);
        let mut b = Sampler::seeded(7);
        for _ in 0..32 {
            assert_eq!(a.normal(0.0, 1.0), b.normal(0.0, 1.0));
        }
    }

    #[test]
    fn uniform_stays_in_the_half_open_range() {
        let mut s = Sampler::seeded(3);
        let draws: Vec<f64> = (0..500).map(|_| s.uniform(0.1, 0.3)).collect();
        assert!(draws.iter().all(|x| (0.1..0.3).contains(x)));
        assert!(draws.iter().any(|x| *x < 0.15) && draws.iter().any(|x| *x > 0.25));
    }

    #[test]
    fn categorical_respects_weights() {
        let table = Categorical::new(&[1u8, 2u8], &[0.0, 1.0]).unwrap();
        let mut s = Sampler::seeded(1);
        assert!((0..100).all(|_| s.pick(&table) == 2));
    }

    #[test]
    fn categorical_rejects_mismatched_tables() {
        assert!(Categorical::new(&[1u8, 2u8, 3u8], &[0.5, 0.5]).is_err());
        assert!(Categorical::<u8>::new(&[1], &[-1.0]).is_err());
    }

    #[test]
    fn invalid_parameters_are_reported() {
        assert!(matches!(
            poisson(-1.0),
            Err(DatagenError::InvalidDistribution { what: "poisson", .. })
        ));
        assert!(beta(0.0, 1.0).is_err());
    }

    #[test]
    fn rounding_and_clipping() {
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(clip(120.0, 0.0, 100.0), 100.0);
        assert_eq!(clip_trunc(12.9, 3.0, 50.0), 12);
        assert_eq!(clip_trunc(-4.0, 3.0, 50.0), 3);
    }
}
