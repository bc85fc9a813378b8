//! Employee generator for turnover classification.
//!
//! Sampling happens in three passes per row: independent features, a
//! correlation pass that nudges dependent features, then a logistic turnover
//! probability and a single Bernoulli outcome. Passes two and three are pure
//! functions of the row so they can be tested without a random source.

use serde::{Deserialize, Serialize};

use forgeml_core::EMPLOYEE_FEATURES;

use crate::sampling::{
    Categorical, DatagenError, Sampler, beta, clip, clip_trunc, exponential, poisson, round_to,
};

pub const TURNOVER_PROBABILITY_BOUNDS: (f64, f64) = (0.02, 0.95);
const TURNOVER_NOISE_SD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmployeeFeatures {
    pub tenure_months: u32,
    pub age: u32,
    pub salary_level: u8,
    pub department: u8,
    pub performance_score: f64,
    pub overtime_hours_monthly: f64,
    pub distance_from_home_km: f64,
    pub num_promotions: u32,
    pub training_hours_yearly: u32,
    pub satisfaction_score: f64,
    pub num_projects_assigned: u32,
}

impl EmployeeFeatures {
    /// Numeric vector in [`EMPLOYEE_FEATURES`] order.
    pub fn to_vector(&self) -> Vec<f64> {
        let v = vec![
            f64::from(self.tenure_months),
            f64::from(self.age),
            f64::from(self.salary_level),
            f64::from(self.department),
            self.performance_score,
            self.overtime_hours_monthly,
            self.distance_from_home_km,
            f64::from(self.num_promotions),
            f64::from(self.training_hours_yearly),
            self.satisfaction_score,
            f64::from(self.num_projects_assigned),
        ];
        debug_assert_eq!(v.len(), EMPLOYEE_FEATURES.len());
        v
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_id: u32,
    #[serde(flatten)]
    pub features: EmployeeFeatures,
    pub has_left: bool,
}

/// Uniform draws in `[0, 1)` consumed by the correlation pass.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationDraws {
    pub salary_bump: f64,
    pub promotion_bump: f64,
}

/// Nudge dependent features based on already sampled ones.
///
/// - tenure over 5 years with salary below 3 gets a raise half the time
/// - tenure over 4 years with no promotions gets one 40% of the time
/// - salary 4 or above cuts overtime by 30%
/// - performance below 5 cuts training hours by 20%
pub fn apply_correlations(f: &mut EmployeeFeatures, draws: CorrelationDraws) {
    if f.tenure_months > 60 && f.salary_level < 3 && draws.salary_bump > 0.5 {
        f.salary_level = (f.salary_level + 1).min(5);
    }
    if f.tenure_months > 48 && f.num_promotions == 0 && draws.promotion_bump > 0.6 {
        f.num_promotions = 1;
    }
    if f.salary_level >= 4 {
        f.overtime_hours_monthly = round_to(f.overtime_hours_monthly * 0.7, 1);
    }
    if f.performance_score < 5.0 {
        f.training_hours_yearly = (f64::from(f.training_hours_yearly) * 0.8) as u32;
    }
}

/// Linear predictor of the turnover logit.
pub fn turnover_log_odds(f: &EmployeeFeatures) -> f64 {
    let mut z = -1.8;

    // Retention factors.
    z -= 0.015 * f64::from(f.tenure_months);
    z -= 0.12 * f64::from(f.salary_level);
    z -= 0.15 * f.satisfaction_score;
    z -= 0.08 * f64::from(f.num_promotions);
    z -= 0.01 * f64::from(f.training_hours_yearly);
    z -= 0.05 * f.performance_score;

    // Attrition factors.
    z += 0.025 * f.overtime_hours_monthly;
    z += 0.012 * f.distance_from_home_km;
    z += 0.05 * f64::from(f.num_projects_assigned);

    z += match f.department {
        2 => 0.3,
        1 => 0.2,
        6 => -0.2,
        _ => 0.0,
    };

    if f.age < 28 {
        z += 0.2;
    } else if f.age > 55 {
        z += 0.15;
    }
    z
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Turnover probability with additive noise, clipped to
/// [`TURNOVER_PROBABILITY_BOUNDS`].
pub fn turnover_probability(f: &EmployeeFeatures, noise: f64) -> f64 {
    clip(
        sigmoid(turnover_log_odds(f)) + noise,
        TURNOVER_PROBABILITY_BOUNDS.0,
        TURNOVER_PROBABILITY_BOUNDS.1,
    )
}

/// Seeded employee dataset generator.
#[derive(Debug, Clone)]
pub struct EmployeeGenerator {
    sampler: Sampler,
}

impl EmployeeGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            sampler: Sampler::seeded(seed),
        }
    }

    pub fn generate(&mut self, n_samples: usize) -> Result<Vec<EmployeeRecord>, DatagenError> {
        let salaries = Categorical::new(&[1u8, 2, 3, 4, 5], &[0.25, 0.30, 0.25, 0.15, 0.05])?;
        let departments =
            Categorical::new(&[1u8, 2, 3, 4, 5, 6], &[0.30, 0.20, 0.15, 0.20, 0.08, 0.07])?;
        let tenure = exponential(30.0)?;
        let performance = beta(5.0, 2.0)?;
        let overtime = exponential(15.0)?;
        let distance = exponential(20.0)?;
        let promotions = poisson(0.8)?;
        let satisfaction = beta(3.0, 2.0)?;
        let projects = poisson(3.0)?;

        let s = &mut self.sampler;
        let mut records = Vec::with_capacity(n_samples);
        for i in 0..n_samples {
            let mut features = EmployeeFeatures {
                tenure_months: clip_trunc(s.draw(&tenure), 1.0, 180.0),
                age: clip_trunc(s.normal(35.0, 10.0), 20.0, 65.0),
                salary_level: s.pick(&salaries),
                department: s.pick(&departments),
                performance_score: round_to(clip(s.draw(&performance) * 10.0, 1.0, 10.0), 1),
                overtime_hours_monthly: round_to(clip(s.draw(&overtime), 0.0, 80.0), 1),
                distance_from_home_km: round_to(clip(s.draw(&distance), 1.0, 100.0), 1),
                num_promotions: clip_trunc(s.draw(&promotions), 0.0, 5.0),
                training_hours_yearly: clip_trunc(s.normal(40.0, 15.0), 0.0, 100.0),
                satisfaction_score: round_to(clip(s.draw(&satisfaction) * 10.0, 1.0, 10.0), 1),
                num_projects_assigned: clip_trunc(s.draw(&projects) + 1.0, 1.0, 10.0),
            };

            let draws = CorrelationDraws {
                salary_bump: s.uniform(0.0, 1.0),
                promotion_bump: s.uniform(0.0, 1.0),
            };
            apply_correlations(&mut features, draws);

            let probability = turnover_probability(&features, s.normal(0.0, TURNOVER_NOISE_SD));
            records.push(EmployeeRecord {
                employee_id: (i + 1) as u32,
                features,
                has_left: s.chance(probability),
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typical() -> EmployeeFeatures {
        EmployeeFeatures {
            tenure_months: 24,
            age: 35,
            salary_level: 2,
            department: 3,
            performance_score: 7.0,
            overtime_hours_monthly: 10.0,
            distance_from_home_km: 15.0,
            num_promotions: 0,
            training_hours_yearly: 40,
            satisfaction_score: 6.0,
            num_projects_assigned: 3,
        }
    }

    const NO_BUMPS: CorrelationDraws = CorrelationDraws {
        salary_bump: 0.0,
        promotion_bump: 0.0,
    };
    const ALL_BUMPS: CorrelationDraws = CorrelationDraws {
        salary_bump: 0.99,
        promotion_bump: 0.99,
    };

    #[test]
    fn long_tenure_raises_salary_and_promotions() {
        let mut f = typical();
        f.tenure_months = 72;
        apply_correlations(&mut f, ALL_BUMPS);
        assert_eq!(f.salary_level, 3);
        assert_eq!(f.num_promotions, 1);

        let mut g = typical();
        g.tenure_months = 72;
        apply_correlations(&mut g, NO_BUMPS);
        assert_eq!(g.salary_level, 2);
        assert_eq!(g.num_promotions, 0);
    }

    #[test]
    fn high_salary_cuts_overtime_and_low_performance_cuts_training() {
        let mut f = typical();
        f.salary_level = 4;
        f.performance_score = 4.0;
        apply_correlations(&mut f, NO_BUMPS);
        assert_eq!(f.overtime_hours_monthly, 7.0);
        assert_eq!(f.training_hours_yearly, 32);
    }

    #[test]
    fn log_odds_of_typical_row() {
        // -1.8 - 0.36 - 0.24 - 0.9 - 0 - 0.4 - 0.35 + 0.25 + 0.18 + 0.15
        let z = turnover_log_odds(&typical());
        assert!((z - -3.47).abs() < 1e-9, "z = {z}");
    }

    #[test]
    fn department_and_age_bands_adjust_log_odds() {
        let base = turnover_log_odds(&typical());
        let mut f = typical();
        f.department = 2;
        assert!((turnover_log_odds(&f) - base - 0.3).abs() < 1e-9);
        f.department = 6;
        assert!((turnover_log_odds(&f) - base + 0.2).abs() < 1e-9);
        f.department = 3;
        f.age = 25;
        assert!((turnover_log_odds(&f) - base - 0.2).abs() < 1e-9);
    }

    #[test]
    fn probability_is_clipped() {
        assert_eq!(turnover_probability(&typical(), -1.0), 0.02);
        assert_eq!(turnover_probability(&typical(), 1.0), 0.95);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn overtime_and_satisfaction_drive_turnover() {
        let mut risky = typical();
        risky.overtime_hours_monthly = 70.0;
        risky.satisfaction_score = 2.0;
        assert!(turnover_log_odds(&risky) > turnover_log_odds(&typical()));
    }

    #[test]
    fn generated_turnover_rate_is_plausible() {
        let rows = EmployeeGenerator::new(42).generate(400).unwrap();
        let left = rows.iter().filter(|r| r.has_left).count();
        assert!(left > 0 && left < rows.len() / 2, "left = {left}");
    }
}
