//! Construction project generator (cost and duration regression targets).
//!
//! Features are drawn from per-feature distributions (log-normal area,
//! Poisson floors, Beta complexity skewed low, exponential experience). Targets
//! are a deterministic multiplicative formula of the features, then perturbed
//! by multiplicative Gaussian noise and floored.

use serde::{Deserialize, Serialize};

use forgeml_core::PROJECT_FEATURES;

use crate::sampling::{
    Categorical, DatagenError, Sampler, beta, clip, clip_trunc, exponential, log_normal, poisson,
    round_to,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectType {
    pub id: u8,
    pub name: &'static str,
    pub cost_factor: f64,
    pub duration_factor: f64,
}

pub const PROJECT_TYPES: [ProjectType; 5] = [
    ProjectType { id: 1, name: "Residential", cost_factor: 1.0, duration_factor: 1.0 },
    ProjectType { id: 2, name: "Commercial", cost_factor: 1.3, duration_factor: 1.2 },
    ProjectType { id: 3, name: "Industrial", cost_factor: 1.5, duration_factor: 1.4 },
    ProjectType { id: 4, name: "Infrastructure", cost_factor: 1.8, duration_factor: 1.6 },
    ProjectType { id: 5, name: "Renovation", cost_factor: 0.8, duration_factor: 0.9 },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationZone {
    pub id: u8,
    pub name: &'static str,
    pub cost_mult: f64,
    pub delay_prob: f64,
}

pub const LOCATION_ZONES: [LocationZone; 4] = [
    LocationZone { id: 1, name: "Urban premium", cost_mult: 1.4, delay_prob: 0.15 },
    LocationZone { id: 2, name: "Urban", cost_mult: 1.2, delay_prob: 0.10 },
    LocationZone { id: 3, name: "Suburban", cost_mult: 1.0, delay_prob: 0.08 },
    LocationZone { id: 4, name: "Rural", cost_mult: 0.85, delay_prob: 0.20 },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialQuality {
    pub id: u8,
    pub name: &'static str,
    pub cost_mult: f64,
}

pub const MATERIAL_QUALITIES: [MaterialQuality; 3] = [
    MaterialQuality { id: 1, name: "Economy", cost_mult: 0.7 },
    MaterialQuality { id: 2, name: "Standard", cost_mult: 1.0 },
    MaterialQuality { id: 3, name: "Premium", cost_mult: 1.5 },
];

/// Base construction cost per square metre before multipliers.
pub const BASE_COST_PER_M2: f64 = 3500.0;
/// Minimum cost per square metre (cost floor).
pub const MIN_COST_PER_M2: f64 = 1000.0;
/// Minimum project duration in days.
pub const MIN_DURATION_DAYS: f64 = 30.0;

pub const AREA_BOUNDS: (f64, f64) = (80.0, 20_000.0);
pub const FLOOR_BOUNDS: (f64, f64) = (1.0, 50.0);
pub const COMPLEXITY_BOUNDS: (f64, f64) = (1.0, 10.0);
pub const TEAM_SIZE_BOUNDS: (f64, f64) = (3.0, 50.0);
pub const EXPERIENCE_BOUNDS: (f64, f64) = (0.5, 30.0);

const COST_NOISE: f64 = 0.12;
const DURATION_NOISE: f64 = 0.15;

/// Lookup clamps out-of-range ids to the nearest table entry.
pub fn project_type(id: u8) -> &'static ProjectType {
    &PROJECT_TYPES[usize::from(id.clamp(1, 5)) - 1]
}

pub fn location_zone(id: u8) -> &'static LocationZone {
    &LOCATION_ZONES[usize::from(id.clamp(1, 4)) - 1]
}

pub fn material_quality(id: u8) -> &'static MaterialQuality {
    &MATERIAL_QUALITIES[usize::from(id.clamp(1, 3)) - 1]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectFeatures {
    pub project_type_id: u8,
    pub area_m2: f64,
    pub num_floors: u32,
    pub location_zone: u8,
    pub complexity_score: f64,
    pub material_quality: u8,
    pub has_basement: bool,
    pub has_pool: bool,
    /// Starting quarter (1-4).
    pub season_start: u8,
    pub team_size: u32,
    pub manager_experience_years: f64,
}

impl ProjectFeatures {
    /// Numeric vector in [`PROJECT_FEATURES`] order.
    pub fn to_vector(&self) -> Vec<f64> {
        let v = vec![
            f64::from(self.project_type_id),
            self.area_m2,
            f64::from(self.num_floors),
            f64::from(self.location_zone),
            self.complexity_score,
            f64::from(self.material_quality),
            if self.has_basement { 1.0 } else { 0.0 },
            if self.has_pool { 1.0 } else { 0.0 },
            f64::from(self.season_start),
            f64::from(self.team_size),
            self.manager_experience_years,
        ];
        debug_assert_eq!(v.len(), PROJECT_FEATURES.len());
        v
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project_id: u32,
    #[serde(flatten)]
    pub features: ProjectFeatures,
    pub actual_cost: f64,
    pub actual_duration_days: u32,
}

/// Noise-free project cost.
///
/// Area cost carries an economies-of-scale discount (0.01% per m², saturating
/// at 50%), then base rate × type × floors × location × quality × complexity
/// (super-linear) × team overhead × experience discount × rainy-season factor,
/// plus additive basement and pool costs.
pub fn expected_cost(f: &ProjectFeatures) -> f64 {
    let base_cost_per_m2 = BASE_COST_PER_M2 * project_type(f.project_type_id).cost_factor;
    let scale_discount = (1.0 - 0.0001 * f.area_m2).max(0.5);
    let area_cost = f.area_m2 * base_cost_per_m2 * scale_discount;

    let floor_mult = 1.0 + (f64::from(f.num_floors) - 1.0) * 0.08;
    let location_mult = location_zone(f.location_zone).cost_mult;
    let quality_mult = material_quality(f.material_quality).cost_mult;
    let complexity_mult = 1.0 + (f.complexity_score / 10.0).powf(1.5) * 0.5;
    let team_factor = 1.0 + (f64::from(f.team_size) - 15.0).max(0.0) * 0.01;
    let experience_discount = 1.0 - (f.manager_experience_years * 0.008).min(0.15);
    let season_factor = if f.season_start >= 3 { 1.05 } else { 1.0 };

    let basement_add = if f.has_basement { f.area_m2 * 1500.0 } else { 0.0 };
    let pool_add = if f.has_pool { 350_000.0 } else { 0.0 };

    area_cost
        * floor_mult
        * location_mult
        * quality_mult
        * complexity_mult
        * team_factor
        * experience_discount
        * season_factor
        + basement_add
        + pool_add
}

/// Final cost from the expected cost and a standard-normal draw `z`.
pub fn noisy_cost(f: &ProjectFeatures, z: f64) -> f64 {
    let total = expected_cost(f);
    let noisy = total + z * total.abs() * COST_NOISE;
    round_to(noisy.max(f.area_m2 * MIN_COST_PER_M2), 2)
}

/// Noise-free project duration in days, given the sampled location delay factor.
pub fn expected_duration(f: &ProjectFeatures, delay_factor: f64) -> f64 {
    let floors = f64::from(f.num_floors);
    let base_days = 30.0 + f.area_m2.sqrt() * 2.0;
    let floor_days = (floors * 12.0 * (1.0 - 0.02 * floors)).max(0.0);
    let basement_days = if f.has_basement { 25.0 } else { 0.0 };
    let pool_days = if f.has_pool { 20.0 } else { 0.0 };

    let type_factor = project_type(f.project_type_id).duration_factor;
    let complexity_factor = 1.0 + (f.complexity_score / 10.0).powi(2) * 0.8;
    let team_efficiency = 1.0 + (f64::from(f.team_size) - 12.0).abs() * 0.015;
    let experience_factor = 1.0 - (f.manager_experience_years * 0.015).min(0.25);
    let quality_factor = 0.9 + f64::from(f.material_quality) * 0.1;
    let season_delay = match f.season_start {
        3 => 1.15,
        4 => 1.10,
        _ => 1.0,
    };

    (base_days + floor_days + basement_days + pool_days)
        * type_factor
        * complexity_factor
        * team_efficiency
        * experience_factor
        * quality_factor
        * delay_factor
        * season_delay
}

/// Final duration in whole days from the expected duration and a standard-normal draw `z`.
pub fn noisy_duration(f: &ProjectFeatures, delay_factor: f64, z: f64) -> u32 {
    let total = expected_duration(f, delay_factor);
    let noisy = total + z * total * DURATION_NOISE;
    noisy.max(MIN_DURATION_DAYS).round() as u32
}

/// Seeded project dataset generator.
#[derive(Debug, Clone)]
pub struct ProjectGenerator {
    sampler: Sampler,
}

impl ProjectGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            sampler: Sampler::seeded(seed),
        }
    }

    pub fn generate(&mut self, n_samples: usize) -> Result<Vec<ProjectRecord>, DatagenError> {
        let types = Categorical::new(&[1u8, 2, 3, 4, 5], &[0.35, 0.25, 0.15, 0.10, 0.15])?;
        let zones = Categorical::new(&[1u8, 2, 3, 4], &[0.15, 0.40, 0.30, 0.15])?;
        let qualities = Categorical::new(&[1u8, 2, 3], &[0.30, 0.50, 0.20])?;
        let seasons = Categorical::new(&[1u8, 2, 3, 4], &[0.30, 0.30, 0.25, 0.15])?;
        let area = log_normal(6.5, 0.8)?;
        let floors = poisson(3.0)?;
        let complexity = beta(2.0, 5.0)?;
        let experience = exponential(5.0)?;

        let s = &mut self.sampler;
        let mut records = Vec::with_capacity(n_samples);
        for i in 0..n_samples {
            let features = ProjectFeatures {
                project_type_id: s.pick(&types),
                area_m2: round_to(clip(s.draw(&area), AREA_BOUNDS.0, AREA_BOUNDS.1), 2),
                num_floors: clip_trunc(s.draw(&floors) + 1.0, FLOOR_BOUNDS.0, FLOOR_BOUNDS.1),
                location_zone: s.pick(&zones),
                complexity_score: round_to(
                    clip(s.draw(&complexity) * 10.0, COMPLEXITY_BOUNDS.0, COMPLEXITY_BOUNDS.1),
                    2,
                ),
                material_quality: s.pick(&qualities),
                has_basement: s.chance(0.25),
                has_pool: s.chance(0.15),
                season_start: s.pick(&seasons),
                team_size: clip_trunc(s.normal(12.0, 4.0), TEAM_SIZE_BOUNDS.0, TEAM_SIZE_BOUNDS.1),
                manager_experience_years: round_to(
                    clip(s.draw(&experience), EXPERIENCE_BOUNDS.0, EXPERIENCE_BOUNDS.1),
                    1,
                ),
            };

            let cost_z = s.normal(0.0, 1.0);
            let delay_factor = if s.chance(location_zone(features.location_zone).delay_prob) {
                1.0 + s.uniform(0.1, 0.3)
            } else {
                1.0
            };
            let duration_z = s.normal(0.0, 1.0);

            records.push(ProjectRecord {
                project_id: (i + 1) as u32,
                features,
                actual_cost: noisy_cost(&features, cost_z),
                actual_duration_days: noisy_duration(&features, delay_factor, duration_z),
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> ProjectFeatures {
        ProjectFeatures {
            project_type_id: 1,
            area_m2: 1000.0,
            num_floors: 1,
            location_zone: 3,
            complexity_score: 0.0,
            material_quality: 2,
            has_basement: false,
            has_pool: false,
            season_start: 1,
            team_size: 12,
            manager_experience_years: 0.0,
        }
    }

    #[test]
    fn baseline_cost_is_area_times_discounted_rate() {
        // 1000 m² × 3500 × (1 − 0.1)
        let cost = expected_cost(&baseline());
        assert!((cost - 3_150_000.0).abs() < 1e-6);
    }

    #[test]
    fn complexity_is_super_linear() {
        let mut f = baseline();
        f.complexity_score = 5.0;
        let mid = expected_cost(&f) - expected_cost(&baseline());
        f.complexity_score = 10.0;
        let high = expected_cost(&f) - expected_cost(&baseline());
        assert!(high > 2.0 * mid);
    }

    #[test]
    fn pool_and_basement_are_additive() {
        let mut f = baseline();
        f.has_pool = true;
        assert!((expected_cost(&f) - expected_cost(&baseline()) - 350_000.0).abs() < 1e-6);
        f.has_pool = false;
        f.has_basement = true;
        assert!((expected_cost(&f) - expected_cost(&baseline()) - 1_500_000.0).abs() < 1e-6);
    }

    #[test]
    fn cost_and_duration_respect_floors_under_extreme_noise() {
        let f = baseline();
        assert_eq!(noisy_cost(&f, -50.0), f.area_m2 * MIN_COST_PER_M2);
        assert_eq!(noisy_duration(&f, 1.0, -50.0), 30);
    }

    #[test]
    fn rainy_quarters_delay_duration() {
        let mut f = baseline();
        let dry = expected_duration(&f, 1.0);
        f.season_start = 3;
        assert!((expected_duration(&f, 1.0) / dry - 1.15).abs() < 1e-9);
        f.season_start = 4;
        assert!((expected_duration(&f, 1.0) / dry - 1.10).abs() < 1e-9);
    }

    #[test]
    fn feature_vector_matches_training_order() {
        let mut f = baseline();
        f.has_pool = true;
        f.team_size = 17;
        let v = f.to_vector();
        let pos = |name: &str| PROJECT_FEATURES.iter().position(|n| *n == name).unwrap();
        assert_eq!(v[pos("has_pool")], 1.0);
        assert_eq!(v[pos("team_size")], 17.0);
        assert_eq!(v[pos("area_m2")], 1000.0);
    }

    #[test]
    fn same_seed_same_dataset() {
        let a = ProjectGenerator::new(42).generate(50).unwrap();
        let b = ProjectGenerator::new(42).generate(50).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.first().map(|r| r.project_id), Some(1));
        assert_eq!(a.last().map(|r| r.project_id), Some(50));
    }
}
