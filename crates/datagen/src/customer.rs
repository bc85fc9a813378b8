//! Customer generator for segmentation.
//!
//! Each segment is sampled from its own distribution parameters (different
//! means and variances), then the segments are concatenated, shuffled and
//! given sequential ids. The clustering model never sees `source_segment`.

use serde::{Deserialize, Serialize};

use crate::sampling::{
    Categorical, DatagenError, Sampler, clip, clip_trunc, exponential, gamma, log_normal, poisson,
    round_to,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSegment {
    Vip,
    Frequent,
    Sporadic,
    New,
}

impl CustomerSegment {
    pub const ALL: [CustomerSegment; 4] = [
        CustomerSegment::Vip,
        CustomerSegment::Frequent,
        CustomerSegment::Sporadic,
        CustomerSegment::New,
    ];

    /// Designed share of the population. `New` takes the rounding remainder.
    pub fn share(self) -> f64 {
        match self {
            CustomerSegment::Vip => 0.12,
            CustomerSegment::Frequent => 0.28,
            CustomerSegment::Sporadic => 0.42,
            CustomerSegment::New => 0.18,
        }
    }
}

/// Row counts per segment for `n` customers, in [`CustomerSegment::ALL`] order.
pub fn segment_sizes(n: usize) -> [usize; 4] {
    let vip = (n as f64 * CustomerSegment::Vip.share()) as usize;
    let frequent = (n as f64 * CustomerSegment::Frequent.share()) as usize;
    let sporadic = (n as f64 * CustomerSegment::Sporadic.share()) as usize;
    [vip, frequent, sporadic, n - vip - frequent - sporadic]
}

pub const PROJECT_FREQUENCY_BOUNDS: (f64, f64) = (0.1, 20.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: u32,
    pub total_revenue: f64,
    pub num_projects: u32,
    pub months_as_customer: u32,
    pub payment_delay_avg_days: f64,
    pub num_referrals: u32,
    pub communication_score: f64,
    pub industry_type: u8,
    pub company_size: u8,
    pub avg_project_value: f64,
    pub project_frequency: f64,
    pub source_segment: CustomerSegment,
}

impl CustomerRecord {
    /// Numeric vector in `CUSTOMER_CLUSTER_FEATURES` order.
    pub fn cluster_features(&self) -> Vec<f64> {
        vec![
            self.total_revenue,
            f64::from(self.num_projects),
            f64::from(self.months_as_customer),
            self.payment_delay_avg_days,
            self.communication_score,
            self.project_frequency,
        ]
    }
}

/// Average value per project.
pub fn avg_project_value(total_revenue: f64, num_projects: u32) -> f64 {
    round_to(total_revenue / f64::from(num_projects.max(1)), 2)
}

/// Projects per year of relationship, clipped to [`PROJECT_FREQUENCY_BOUNDS`].
pub fn project_frequency(num_projects: u32, months_as_customer: u32) -> f64 {
    let years = f64::from(months_as_customer.max(1)) / 12.0;
    clip(
        round_to(f64::from(num_projects) / years, 2),
        PROJECT_FREQUENCY_BOUNDS.0,
        PROJECT_FREQUENCY_BOUNDS.1,
    )
}

/// Sampled columns of one customer before ids and ratios are derived.
#[derive(Debug, Clone, Copy)]
struct RawCustomer {
    total_revenue: f64,
    num_projects: u32,
    months_as_customer: u32,
    payment_delay_avg_days: f64,
    num_referrals: u32,
    communication_score: f64,
    industry_type: u8,
    company_size: u8,
    segment: CustomerSegment,
}

/// Seeded customer dataset generator.
#[derive(Debug, Clone)]
pub struct CustomerGenerator {
    sampler: Sampler,
}

impl CustomerGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            sampler: Sampler::seeded(seed),
        }
    }

    pub fn generate(&mut self, n_samples: usize) -> Result<Vec<CustomerRecord>, DatagenError> {
        let sizes = segment_sizes(n_samples);
        let mut raw = Vec::with_capacity(n_samples);
        for (segment, count) in CustomerSegment::ALL.into_iter().zip(sizes) {
            for _ in 0..count {
                raw.push(self.sample(segment)?);
            }
        }
        self.sampler.shuffle(&mut raw);

        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(i, c)| CustomerRecord {
                customer_id: (i + 1) as u32,
                total_revenue: c.total_revenue,
                num_projects: c.num_projects,
                months_as_customer: c.months_as_customer,
                payment_delay_avg_days: c.payment_delay_avg_days,
                num_referrals: c.num_referrals,
                communication_score: c.communication_score,
                industry_type: c.industry_type,
                company_size: c.company_size,
                avg_project_value: avg_project_value(c.total_revenue, c.num_projects),
                project_frequency: project_frequency(c.num_projects, c.months_as_customer),
                source_segment: c.segment,
            })
            .collect())
    }

    fn sample(&mut self, segment: CustomerSegment) -> Result<RawCustomer, DatagenError> {
        match segment {
            CustomerSegment::Vip => self.sample_vip(),
            CustomerSegment::Frequent => self.sample_frequent(),
            CustomerSegment::Sporadic => self.sample_sporadic(),
            CustomerSegment::New => self.sample_new(),
        }
    }

    /// High value, long tenure, very engaged, large companies.
    fn sample_vip(&mut self) -> Result<RawCustomer, DatagenError> {
        let industries = Categorical::new(&[1u8, 2, 4], &[0.4, 0.4, 0.2])?;
        let s = &mut self.sampler;
        Ok(RawCustomer {
            total_revenue: clip(s.draw(&log_normal(16.5, 0.4)?), 5_000_000.0, 50_000_000.0),
            num_projects: s.draw(&poisson(12.0)?) as u32 + 5,
            months_as_customer: clip_trunc(s.normal(60.0, 15.0), 36.0, 120.0),
            payment_delay_avg_days: round_to(clip(s.draw(&gamma(1.5, 2.0)?), 0.0, 10.0), 1),
            num_referrals: s.draw(&poisson(4.0)?) as u32,
            communication_score: round_to(clip(s.normal(9.0, 0.5), 7.0, 10.0), 1),
            industry_type: s.pick(&industries),
            company_size: 3,
            segment: CustomerSegment::Vip,
        })
    }

    /// Regular engagement, moderate value.
    fn sample_frequent(&mut self) -> Result<RawCustomer, DatagenError> {
        let industries = Categorical::new(&[1u8, 2, 3, 4, 5], &[0.3, 0.25, 0.2, 0.15, 0.1])?;
        let sizes = Categorical::new(&[2u8, 3], &[0.6, 0.4])?;
        let s = &mut self.sampler;
        Ok(RawCustomer {
            total_revenue: clip(s.draw(&log_normal(15.0, 0.5)?), 1_000_000.0, 10_000_000.0),
            num_projects: s.draw(&poisson(6.0)?) as u32 + 2,
            months_as_customer: clip_trunc(s.normal(36.0, 12.0), 18.0, 72.0),
            payment_delay_avg_days: round_to(clip(s.draw(&gamma(2.0, 3.0)?), 0.0, 20.0), 1),
            num_referrals: s.draw(&poisson(2.0)?) as u32,
            communication_score: round_to(clip(s.normal(7.5, 1.0), 5.0, 10.0), 1),
            industry_type: s.pick(&industries),
            company_size: s.pick(&sizes),
            segment: CustomerSegment::Frequent,
        })
    }

    /// Occasional projects, slow payers, price sensitive.
    fn sample_sporadic(&mut self) -> Result<RawCustomer, DatagenError> {
        let industries = Categorical::uniform(&[1u8, 2, 3, 4, 5, 6])?;
        let sizes = Categorical::new(&[1u8, 2], &[0.7, 0.3])?;
        let s = &mut self.sampler;
        Ok(RawCustomer {
            total_revenue: clip(s.draw(&log_normal(13.5, 0.7)?), 200_000.0, 3_000_000.0),
            num_projects: s.draw(&poisson(2.0)?) as u32 + 1,
            months_as_customer: clip_trunc(s.draw(&exponential(24.0)?), 6.0, 60.0),
            payment_delay_avg_days: round_to(clip(s.draw(&gamma(2.5, 5.0)?), 0.0, 45.0), 1),
            num_referrals: s.draw(&poisson(0.5)?) as u32,
            communication_score: round_to(clip(s.normal(6.5, 1.5), 3.0, 10.0), 1),
            industry_type: s.pick(&industries),
            company_size: s.pick(&sizes),
            segment: CustomerSegment::Sporadic,
        })
    }

    /// Recent customers with one or two projects and no referrals yet.
    fn sample_new(&mut self) -> Result<RawCustomer, DatagenError> {
        let projects = Categorical::new(&[1u32, 2], &[0.7, 0.3])?;
        let industries = Categorical::uniform(&[1u8, 2, 3, 4, 5, 6])?;
        let sizes = Categorical::new(&[1u8, 2, 3], &[0.5, 0.35, 0.15])?;
        let s = &mut self.sampler;
        Ok(RawCustomer {
            total_revenue: clip(s.draw(&log_normal(12.5, 0.8)?), 100_000.0, 2_000_000.0),
            num_projects: s.pick(&projects),
            months_as_customer: clip_trunc(s.uniform(1.0, 12.0), 1.0, 12.0),
            payment_delay_avg_days: round_to(clip(s.draw(&gamma(2.0, 4.0)?), 0.0, 30.0), 1),
            num_referrals: 0,
            communication_score: round_to(clip(s.normal(7.0, 1.2), 4.0, 10.0), 1),
            industry_type: s.pick(&industries),
            company_size: s.pick(&sizes),
            segment: CustomerSegment::New,
        })
    }
}
