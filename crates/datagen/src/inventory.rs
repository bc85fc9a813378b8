//! Daily material demand series with a simulated stock level.
//!
//! Demand combines a linear trend, annual seasonality peaking in late spring,
//! a weekly pattern suppressed on weekends, holiday multipliers, rare random
//! events and Gaussian noise. Stock walks the demand day by day with a single
//! outstanding replenishment order at a time.

use std::f64::consts::PI;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use forgeml_core::MaterialId;

use crate::sampling::{DatagenError, Sampler, round_to};

/// One catalog entry: demand shape, cost and replenishment policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: &'static str,
    pub unit: &'static str,
    pub base_demand: f64,
    pub seasonal_amplitude: f64,
    pub weekly_amplitude: f64,
    /// Demand change per day.
    pub trend: f64,
    pub noise_std: f64,
    pub unit_cost: f64,
    pub reorder_point: f64,
    pub lead_time_days: u32,
}

pub const MATERIALS: [Material; 5] = [
    Material {
        id: MaterialId(1),
        name: "Portland Cement",
        unit: "sacks",
        base_demand: 120.0,
        seasonal_amplitude: 25.0,
        weekly_amplitude: 15.0,
        trend: 0.008,
        noise_std: 12.0,
        unit_cost: 185.50,
        reorder_point: 200.0,
        lead_time_days: 3,
    },
    Material {
        id: MaterialId(2),
        name: "Steel Rebar",
        unit: "tonnes",
        base_demand: 8.0,
        seasonal_amplitude: 1.5,
        weekly_amplitude: 1.0,
        trend: 0.012,
        noise_std: 1.2,
        unit_cost: 18_500.0,
        reorder_point: 15.0,
        lead_time_days: 5,
    },
    Material {
        id: MaterialId(3),
        name: "Concrete Block",
        unit: "pieces",
        base_demand: 450.0,
        seasonal_amplitude: 80.0,
        weekly_amplitude: 50.0,
        trend: 0.005,
        noise_std: 45.0,
        unit_cost: 12.50,
        reorder_point: 800.0,
        lead_time_days: 2,
    },
    Material {
        id: MaterialId(4),
        name: "Sand",
        unit: "m³",
        base_demand: 35.0,
        seasonal_amplitude: 8.0,
        weekly_amplitude: 5.0,
        trend: 0.006,
        noise_std: 5.0,
        unit_cost: 350.0,
        reorder_point: 60.0,
        lead_time_days: 2,
    },
    Material {
        id: MaterialId(5),
        name: "Gravel",
        unit: "m³",
        base_demand: 28.0,
        seasonal_amplitude: 6.0,
        weekly_amplitude: 4.0,
        trend: 0.005,
        noise_std: 4.0,
        unit_cost: 420.0,
        reorder_point: 50.0,
        lead_time_days: 2,
    },
];

const EVENT_PROBABILITY: f64 = 0.02;
const EVENT_FACTOR_RANGE: (f64, f64) = (0.5, 1.8);
const INITIAL_STOCK_MULTIPLE: f64 = 3.0;
const ORDER_QUANTITY_MULTIPLE: f64 = 2.5;

pub fn material(id: MaterialId) -> Option<&'static Material> {
    MATERIALS.iter().find(|m| m.id == id)
}

pub fn material_or_err(id: MaterialId) -> Result<&'static Material, DatagenError> {
    material(id).ok_or(DatagenError::UnknownMaterial(id.get()))
}

/// Annual component, peaking around day 181.
pub fn seasonal_component(amplitude: f64, day_of_year: u32) -> f64 {
    amplitude * (2.0 * PI * (f64::from(day_of_year) - 90.0) / 365.0).sin()
}

/// Weekly component; `weekday` counts from Monday = 0.
pub fn weekly_component(amplitude: f64, weekday: u32) -> f64 {
    if weekday >= 5 {
        -amplitude * 0.7
    } else {
        amplitude * (2.0 * PI * f64::from(weekday) / 5.0).sin() * 0.3
    }
}

/// Demand multiplier for year-end, new-year and Easter periods.
pub fn holiday_factor(date: NaiveDate) -> f64 {
    match (date.month(), date.day()) {
        (12, d) if d >= 20 => 0.4,
        (1, d) if d <= 6 => 0.5,
        (4, d) if (10..=20).contains(&d) => 0.6,
        _ => 1.0,
    }
}

/// Demand before noise for day `index` of a series, given the event factor.
pub fn expected_demand(m: &Material, date: NaiveDate, index: usize, event_factor: f64) -> f64 {
    let trend = m.trend * index as f64;
    let seasonal = seasonal_component(m.seasonal_amplitude, date.ordinal());
    let weekly = weekly_component(m.weekly_amplitude, date.weekday().num_days_from_monday());
    (m.base_demand + trend + seasonal + weekly) * holiday_factor(date) * event_factor
}

/// Walk a demand series and return the end-of-day stock for each day.
///
/// Day 0 opens at three times the reorder point. A pending order lands at the
/// start of its arrival day. At most one order is outstanding. Stock never
/// goes negative; unmet demand is lost.
pub fn simulate_stock_levels(demands: &[f64], reorder_point: f64, lead_time_days: u32) -> Vec<f64> {
    let mut stock = Vec::with_capacity(demands.len());
    if demands.is_empty() {
        return stock;
    }
    stock.push(reorder_point * INITIAL_STOCK_MULTIPLE);

    let order_quantity = reorder_point * ORDER_QUANTITY_MULTIPLE;
    let lead = lead_time_days.max(1) as usize;
    let mut pending: Option<(usize, f64)> = None;

    for (i, demand) in demands.iter().enumerate().skip(1) {
        let mut opening = stock[i - 1];
        if let Some((_, quantity)) = pending.filter(|(arrival, _)| *arrival == i) {
            opening += quantity;
            pending = None;
        }

        let today = opening - demand;
        if today <= reorder_point && pending.is_none() {
            pending = Some((i + lead, order_quantity));
        }
        stock.push(today.max(0.0));
    }
    stock
}

/// Base demand plus the seasonal component at mid-month, January to December.
pub fn seasonality_pattern(m: &Material) -> [f64; 12] {
    let mut values = [0.0; 12];
    for (month, value) in values.iter_mut().enumerate() {
        let day_of_year = (month as u32) * 30 + 15;
        *value = round_to(m.base_demand + seasonal_component(m.seasonal_amplitude, day_of_year), 1);
    }
    values
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub date: NaiveDate,
    pub material_id: MaterialId,
    pub material_name: String,
    pub unit: String,
    pub daily_demand: f64,
    pub stock_level: f64,
    pub reorder_point: f64,
    pub lead_time_days: u32,
    pub unit_cost: f64,
}

/// Seeded inventory history generator.
#[derive(Debug, Clone)]
pub struct InventoryGenerator {
    sampler: Sampler,
}

impl InventoryGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            sampler: Sampler::seeded(seed),
        }
    }

    /// `days` of history for every catalog material, ending on `end_date`.
    pub fn generate(
        &mut self,
        days: usize,
        end_date: NaiveDate,
    ) -> Result<Vec<InventoryRecord>, DatagenError> {
        let ids: Vec<MaterialId> = MATERIALS.iter().map(|m| m.id).collect();
        self.generate_for(&ids, days, end_date)
    }

    pub fn generate_for(
        &mut self,
        ids: &[MaterialId],
        days: usize,
        end_date: NaiveDate,
    ) -> Result<Vec<InventoryRecord>, DatagenError> {
        let start = end_date - Duration::days(days.saturating_sub(1) as i64);
        let mut records = Vec::with_capacity(ids.len() * days);
        for id in ids {
            let m = material_or_err(*id)?;
            records.extend(self.material_series(m, start, days));
        }
        Ok(records)
    }

    fn material_series(&mut self, m: &Material, start: NaiveDate, days: usize) -> Vec<InventoryRecord> {
        let dates: Vec<NaiveDate> = (0..days).map(|i| start + Duration::days(i as i64)).collect();

        let demands: Vec<f64> = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let event_factor = if self.sampler.chance(EVENT_PROBABILITY) {
                    self.sampler.uniform(EVENT_FACTOR_RANGE.0, EVENT_FACTOR_RANGE.1)
                } else {
                    1.0
                };
                let noise = self.sampler.normal(0.0, m.noise_std);
                round_to((expected_demand(m, *date, i, event_factor) + noise).max(0.0), 2)
            })
            .collect();

        let stock = simulate_stock_levels(&demands, m.reorder_point, m.lead_time_days);

        dates
            .into_iter()
            .zip(demands)
            .zip(stock)
            .map(|((date, daily_demand), stock_level)| InventoryRecord {
                date,
                material_id: m.id,
                material_name: m.name.to_string(),
                unit: m.unit.to_string(),
                daily_demand,
                stock_level: round_to(stock_level, 2),
                reorder_point: m.reorder_point,
                lead_time_days: m.lead_time_days,
                unit_cost: m.unit_cost,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn holiday_periods() {
        assert_eq!(holiday_factor(date(2024, 12, 24)), 0.4);
        assert_eq!(holiday_factor(date(2024, 12, 19)), 1.0);
        assert_eq!(holiday_factor(date(2025, 1, 6)), 0.5);
        assert_eq!(holiday_factor(date(2025, 4, 15)), 0.6);
        assert_eq!(holiday_factor(date(2025, 4, 21)), 1.0);
    }

    #[test]
    fn weekends_are_suppressed() {
        assert_eq!(weekly_component(10.0, 5), -7.0);
        assert_eq!(weekly_component(10.0, 6), -7.0);
        assert_eq!(weekly_component(10.0, 0), 0.0);
        assert!(weekly_component(10.0, 1) > 0.0);
    }

    #[test]
    fn seasonality_peaks_mid_year() {
        let cement = material(MaterialId(1)).unwrap();
        let pattern = seasonality_pattern(cement);
        let peak = pattern
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!((5..=6).contains(&peak), "peak month index {peak}");
        assert!(pattern[11] < cement.base_demand);
    }

    #[test]
    fn stock_reorders_and_receives_after_lead_time() {
        // rp 10: open 30, order 25, lead 2.
        let demands = [0.0, 10.0, 10.0, 5.0, 5.0, 5.0];
        let stock = simulate_stock_levels(&demands, 10.0, 2);
        // Day 2 drops to 10 and orders for day 4.
        assert_eq!(stock, vec![30.0, 20.0, 10.0, 5.0, 25.0, 20.0]);
    }

    #[test]
    fn stock_never_goes_negative() {
        let stock = simulate_stock_levels(&[0.0, 100.0, 100.0], 5.0, 10);
        assert_eq!(stock, vec![15.0, 0.0, 0.0]);
        assert!(simulate_stock_levels(&[], 5.0, 1).is_empty());
    }

    #[test]
    fn unknown_material_is_rejected() {
        let err = InventoryGenerator::new(1)
            .generate_for(&[MaterialId(99)], 10, date(2025, 1, 1))
            .unwrap_err();
        assert_eq!(err, DatagenError::UnknownMaterial(99));
    }

    #[test]
    fn series_covers_every_material_and_ends_on_end_date() {
        let end = date(2025, 6, 30);
        let rows = InventoryGenerator::new(42).generate(60, end).unwrap();
        assert_eq!(rows.len(), 5 * 60);
        for m in &MATERIALS {
            let series: Vec<_> = rows.iter().filter(|r| r.material_id == m.id).collect();
            assert_eq!(series.len(), 60);
            assert_eq!(series.last().map(|r| r.date), Some(end));
            assert_eq!(series.first().map(|r| r.date), Some(date(2025, 5, 2)));
            assert!(series.iter().all(|r| r.daily_demand >= 0.0 && r.stock_level >= 0.0));
        }
    }
}
