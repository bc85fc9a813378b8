//! Forecasting engine: per-request demand forecast with stock simulation,
//! plus the inventory overview.
//!
//! The primary model is an ARIMA(2,1,2) fitted on the material's history at
//! request time. When that fit fails the engine takes the moving-average
//! branch instead and tags the result with [`ForecastModelKind::Fallback`];
//! a failed primary fit is never surfaced as an error.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

use forgeml_ai::stats::mean;
use forgeml_ai::{ARIMA_LABEL, Arima, MovingAverageForecaster, SeriesForecast};
use forgeml_core::{DomainError, DomainResult, FeatureMap, INVENTORY_FORECAST_SCHEMA, MaterialId};
use forgeml_datagen::{InventoryRecord, material, seasonality_pattern};

use crate::models::round_to;

/// One-sided normal quantile for a 95% service level.
pub const SERVICE_LEVEL_Z: f64 = 1.65;
/// Historical observations echoed back with a forecast.
pub const HISTORY_TAIL: usize = 90;
pub const MAX_FORECAST_DAYS: u32 = 365;
/// Stock cover (days) under which a material is flagged.
pub const STOCKOUT_IMMINENT_DAYS: f64 = 5.0;
pub const LOW_STOCK_DAYS: f64 = 15.0;
/// Stock cover reported when there is no demand.
pub const UNBOUNDED_STOCK_DAYS: f64 = 999.0;

const UNKNOWN_MATERIAL_UNIT: &str = "units";
const UNKNOWN_MATERIAL_UNIT_COST: f64 = 100.0;

/// Stock trajectory under `demand`: each day subtracts that day's demand from
/// the previous level, floored at zero.
pub fn simulate_stock(current_stock: f64, demand: &[f64]) -> Vec<f64> {
    let mut level = current_stock;
    demand
        .iter()
        .map(|d| {
            level = (level - d).max(0.0);
            level
        })
        .collect()
}

/// First day (1-based) on which simulated stock is at or below zero.
pub fn stockout_day(stock: &[f64]) -> Option<u32> {
    stock.iter().position(|s| *s <= 0.0).map(|i| i as u32 + 1)
}

/// `mae × 1.65 × √lead_time`.
pub fn safety_stock(mae: f64, lead_time_days: u32) -> f64 {
    mae * SERVICE_LEVEL_Z * f64::from(lead_time_days).sqrt()
}

/// Demand over the horizon plus safety stock and reorder point, net of stock
/// on hand; never negative.
pub fn recommended_order(
    total_demand: f64,
    safety_stock: f64,
    current_stock: f64,
    reorder_point: f64,
) -> f64 {
    (total_demand + safety_stock - current_stock + reorder_point).max(0.0)
}

/// Validated parameters of one forecast request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRequest {
    pub material_id: MaterialId,
    pub forecast_days: u32,
    pub current_stock: f64,
    pub reorder_point: f64,
    pub lead_time_days: u32,
}

fn whole(features: &FeatureMap, key: &str, min: f64, max: f64) -> DomainResult<u32> {
    let v = features
        .get(key)
        .ok_or_else(|| DomainError::missing_feature(key))?;
    if v.fract() != 0.0 || v < min || v > max {
        return Err(DomainError::validation(format!(
            "{key} must be a whole number in [{min}, {max}], got {v}"
        )));
    }
    Ok(v as u32)
}

fn non_negative(features: &FeatureMap, key: &str) -> DomainResult<f64> {
    let v = features
        .get(key)
        .ok_or_else(|| DomainError::missing_feature(key))?;
    if v < 0.0 {
        return Err(DomainError::validation(format!("{key} must not be negative")));
    }
    Ok(v)
}

impl ForecastRequest {
    pub fn from_features(features: FeatureMap) -> DomainResult<Self> {
        let f = INVENTORY_FORECAST_SCHEMA.resolve(features)?;
        Ok(Self {
            material_id: MaterialId(whole(&f, "material_id", 1.0, f64::from(u32::MAX))?),
            forecast_days: whole(&f, "forecast_days", 1.0, f64::from(MAX_FORECAST_DAYS))?,
            current_stock: non_negative(&f, "current_stock")?,
            reorder_point: non_negative(&f, "reorder_point")?,
            lead_time_days: whole(&f, "lead_time_days", 0.0, f64::from(MAX_FORECAST_DAYS))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastModelKind {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialInfo {
    pub id: MaterialId,
    pub name: String,
    pub unit: String,
    #[serde(skip)]
    pub unit_cost: f64,
}

impl MaterialInfo {
    /// Catalog entry, or a generic description for ids only seen in history.
    pub fn lookup(id: MaterialId) -> Self {
        match material(id) {
            Some(m) => Self {
                id,
                name: m.name.to_string(),
                unit: m.unit.to_string(),
                unit_cost: m.unit_cost,
            },
            None => Self {
                id,
                name: format!("Material {id}"),
                unit: UNKNOWN_MATERIAL_UNIT.to_string(),
                unit_cost: UNKNOWN_MATERIAL_UNIT_COST,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
    pub stock_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub predicted_demand_total: f64,
    pub predicted_demand_daily_avg: f64,
    pub days_until_stockout: Option<u32>,
    pub recommended_order_quantity: f64,
    pub safety_stock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastModelInfo {
    pub name: String,
    pub kind: ForecastModelKind,
    pub mae: f64,
    pub mape: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub material: MaterialInfo,
    pub forecast: ForecastSummary,
    pub model_info: ForecastModelInfo,
    pub daily_forecast: Vec<DailyForecast>,
    pub historical: Vec<InventoryRecord>,
    /// Mid-month demand profile, for catalog materials only.
    pub seasonality_pattern: Option<[f64; 12]>,
}

/// A fitted series forecast and which branch produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedForecast {
    pub forecast: SeriesForecast,
    pub kind: ForecastModelKind,
    pub name: String,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastEngine {
    fallback: MovingAverageForecaster,
}

impl ForecastEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_window(mut self, window: usize) -> Self {
        self.fallback = self.fallback.with_window(window);
        self
    }

    /// Primary ARIMA forecast, or the moving-average branch if the fit fails.
    pub fn fit(&self, series: &[f64], horizon: usize) -> DomainResult<FittedForecast> {
        match Arima::fit(series) {
            Ok(model) => {
                let [ar1, ar2] = model.ar();
                let [ma1, ma2] = model.ma();
                debug!(ar1, ar2, ma1, ma2, sigma2 = model.sigma2(), "ARIMA fitted");
                Ok(FittedForecast {
                    forecast: model.forecast(horizon),
                    kind: ForecastModelKind::Primary,
                    name: ARIMA_LABEL.to_string(),
                    fallback_reason: None,
                })
            }
            Err(e) => {
                warn!(error = %e, observations = series.len(), "ARIMA fit failed; using moving average");
                let forecast = self
                    .fallback
                    .forecast(series, horizon)
                    .map_err(|e| DomainError::ModelFitFailure(e.to_string()))?;
                Ok(FittedForecast {
                    forecast,
                    kind: ForecastModelKind::Fallback,
                    name: format!("MovingAverage({})", self.fallback.window()),
                    fallback_reason: Some(e.to_string()),
                })
            }
        }
    }

    /// Forecast demand for one material from `history` (all materials mixed).
    pub fn forecast(
        &self,
        history: &[InventoryRecord],
        request: &ForecastRequest,
    ) -> DomainResult<ForecastResult> {
        let mut rows: Vec<&InventoryRecord> = history
            .iter()
            .filter(|r| r.material_id == request.material_id)
            .collect();
        if rows.is_empty() {
            return Err(DomainError::unknown_entity("material", request.material_id));
        }
        rows.sort_by_key(|r| r.date);

        let series: Vec<f64> = rows.iter().map(|r| r.daily_demand).collect();
        let horizon = request.forecast_days as usize;
        let fitted = self.fit(&series, horizon)?;
        let f = &fitted.forecast;

        let stock = simulate_stock(request.current_stock, &f.mean);
        let total: f64 = f.mean.iter().sum();
        let safety = safety_stock(f.mae, request.lead_time_days);
        let order = recommended_order(total, safety, request.current_stock, request.reorder_point);

        let last_date = rows[rows.len() - 1].date;
        let daily_forecast = (0..horizon)
            .map(|i| DailyForecast {
                date: last_date + Duration::days(i as i64 + 1),
                predicted: round_to(f.mean[i], 2),
                lower: round_to(f.lower[i].max(0.0), 2),
                upper: round_to(f.upper[i], 2),
                stock_level: round_to(stock[i], 2),
            })
            .collect();

        let material = MaterialInfo::lookup(request.material_id);
        debug!(
            material_id = %request.material_id,
            model = %fitted.name,
            horizon,
            "forecast computed"
        );

        Ok(ForecastResult {
            seasonality_pattern: forgeml_datagen::material(request.material_id).map(seasonality_pattern),
            material,
            forecast: ForecastSummary {
                predicted_demand_total: round_to(total, 2),
                predicted_demand_daily_avg: round_to(mean(&f.mean), 2),
                days_until_stockout: stockout_day(&stock),
                recommended_order_quantity: order.round(),
                safety_stock: round_to(safety, 2),
            },
            model_info: ForecastModelInfo {
                name: fitted.name.clone(),
                kind: fitted.kind,
                mae: round_to(f.mae, 2),
                mape: round_to(f.mape, 2),
                fallback_reason: fitted.fallback_reason.clone(),
            },
            daily_forecast,
            historical: rows[rows.len().saturating_sub(HISTORY_TAIL)..]
                .iter()
                .map(|r| (*r).clone())
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "alert_type", rename_all = "snake_case")]
pub enum InventoryAlert {
    StockoutImminent {
        material_id: MaterialId,
        material_name: String,
        days_until_stockout: f64,
        recommended_action: String,
    },
    LowStock {
        material_id: MaterialId,
        material_name: String,
        current_stock_days: f64,
        recommended_action: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialSummary {
    pub material_id: MaterialId,
    pub name: String,
    pub current_stock: f64,
    pub avg_daily_demand: f64,
    pub stock_days: f64,
    pub unit_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySummary {
    pub total_inventory_value: f64,
    pub items_below_reorder: usize,
    pub items_at_risk: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryOverview {
    pub materials_analyzed: usize,
    pub alerts: Vec<InventoryAlert>,
    pub summary: InventorySummary,
    pub materials: Vec<MaterialSummary>,
}

/// Days of cover at the average demand rate.
pub fn stock_days(stock: f64, avg_daily_demand: f64) -> f64 {
    if avg_daily_demand > 0.0 {
        stock / avg_daily_demand
    } else {
        UNBOUNDED_STOCK_DAYS
    }
}

/// Latest stock, average demand and cover per material, with alerts.
pub fn inventory_overview(history: &[InventoryRecord]) -> InventoryOverview {
    let mut by_material: BTreeMap<MaterialId, Vec<&InventoryRecord>> = BTreeMap::new();
    for r in history {
        by_material.entry(r.material_id).or_default().push(r);
    }

    let mut alerts = Vec::new();
    let mut materials = Vec::with_capacity(by_material.len());
    for (id, mut rows) in by_material {
        rows.sort_by_key(|r| r.date);
        let info = MaterialInfo::lookup(id);
        let latest_stock = rows.last().map_or(0.0, |r| r.stock_level);
        let demand: Vec<f64> = rows.iter().map(|r| r.daily_demand).collect();
        let avg = mean(&demand);
        let days = stock_days(latest_stock, avg);

        if days < STOCKOUT_IMMINENT_DAYS {
            alerts.push(InventoryAlert::StockoutImminent {
                material_id: id,
                material_name: info.name.clone(),
                days_until_stockout: round_to(days, 1),
                recommended_action: "Order urgently".to_string(),
            });
        } else if days < LOW_STOCK_DAYS {
            alerts.push(InventoryAlert::LowStock {
                material_id: id,
                material_name: info.name.clone(),
                current_stock_days: round_to(days, 1),
                recommended_action: "Plan a reorder".to_string(),
            });
        }

        materials.push(MaterialSummary {
            material_id: id,
            name: info.name,
            current_stock: round_to(latest_stock, 2),
            avg_daily_demand: round_to(avg, 2),
            stock_days: round_to(days, 1),
            unit_cost: info.unit_cost,
        });
    }

    let total_value: f64 = materials.iter().map(|m| m.current_stock * m.unit_cost).sum();
    let at_risk = alerts
        .iter()
        .filter(|a| matches!(a, InventoryAlert::StockoutImminent { .. }))
        .count();

    InventoryOverview {
        materials_analyzed: materials.len(),
        summary: InventorySummary {
            total_inventory_value: round_to(total_value, 2),
            items_below_reorder: alerts.len() - at_risk,
            items_at_risk: at_risk,
        },
        alerts,
        materials,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use forgeml_datagen::InventoryGenerator;
    use proptest::prelude::*;

    fn history(id: u32, demand: &[f64], stock: f64) -> Vec<InventoryRecord> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        demand
            .iter()
            .enumerate()
            .map(|(i, d)| InventoryRecord {
                date: start + Duration::days(i as i64),
                material_id: MaterialId(id),
                material_name: format!("m{id}"),
                unit: "units".to_string(),
                daily_demand: *d,
                stock_level: stock,
                reorder_point: 10.0,
                lead_time_days: 2,
                unit_cost: 1.0,
            })
            .collect()
    }

    fn request(id: u32, days: u32) -> ForecastRequest {
        ForecastRequest {
            material_id: MaterialId(id),
            forecast_days: days,
            current_stock: 100.0,
            reorder_point: 20.0,
            lead_time_days: 4,
        }
    }

    #[test]
    fn safety_stock_at_known_point() {
        assert!((safety_stock(10.0, 4) - 33.0).abs() < 1e-9);
        assert_eq!(safety_stock(10.0, 0), 0.0);
    }

    #[test]
    fn stockout_is_first_day_at_zero() {
        let stock = simulate_stock(70.0, &[20.0, 20.0, 20.0, 15.0, 5.0]);
        assert_eq!(stock, vec![50.0, 30.0, 10.0, 0.0, 0.0]);
        assert_eq!(stockout_day(&stock), Some(4));
        assert_eq!(stockout_day(&[50.0, 30.0, 0.0]), Some(3));
        assert_eq!(stockout_day(&[5.0, 4.0]), None);
    }

    #[test]
    fn recommended_order_is_floored_at_zero() {
        assert_eq!(recommended_order(100.0, 10.0, 50.0, 20.0), 80.0);
        assert_eq!(recommended_order(10.0, 1.0, 500.0, 20.0), 0.0);
    }

    #[test]
    fn constant_zero_series_takes_the_fallback_branch() {
        let h = history(1, &[0.0; 60], 0.0);
        let result = ForecastEngine::new().forecast(&h, &request(1, 14)).unwrap();

        assert_eq!(result.daily_forecast.len(), 14);
        assert_eq!(result.model_info.kind, ForecastModelKind::Fallback);
        assert_ne!(result.model_info.name, ARIMA_LABEL);
        assert!(result.model_info.fallback_reason.is_some());
        assert_eq!(result.model_info.mape, 0.0);
        assert_eq!(result.forecast.days_until_stockout, None);
    }

    #[test]
    fn fallback_uses_the_configured_window() {
        let fitted = ForecastEngine::new()
            .with_fallback_window(7)
            .fit(&[0.0; 40], 3)
            .unwrap();
        assert_eq!(fitted.name, "MovingAverage(7)");
        assert_eq!(fitted.kind, ForecastModelKind::Fallback);
    }

    #[test]
    fn too_short_series_also_falls_back() {
        let h = history(2, &[5.0, 7.0, 6.0], 10.0);
        let result = ForecastEngine::new().forecast(&h, &request(2, 5)).unwrap();
        assert_eq!(result.model_info.kind, ForecastModelKind::Fallback);
        assert_eq!(result.daily_forecast[0].predicted, 6.0);
        assert_eq!(result.historical.len(), 3);
    }

    #[test]
    fn generated_history_uses_the_primary_model() {
        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let h = InventoryGenerator::new(42).generate(365, end).unwrap();
        let result = ForecastEngine::new().forecast(&h, &request(1, 30)).unwrap();

        assert_eq!(result.model_info.kind, ForecastModelKind::Primary);
        assert_eq!(result.model_info.name, ARIMA_LABEL);
        assert_eq!(result.material.name, "Portland Cement");
        assert_eq!(result.historical.len(), HISTORY_TAIL);
        assert_eq!(
            result.daily_forecast[0].date,
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
        assert!(result.daily_forecast.iter().all(|d| d.lower >= 0.0));
        assert!(result.seasonality_pattern.is_some());
    }

    #[test]
    fn unknown_material_is_a_client_error() {
        let h = history(1, &[1.0; 20], 5.0);
        let err = ForecastEngine::new().forecast(&h, &request(9, 5)).unwrap_err();
        assert_eq!(err, DomainError::unknown_entity("material", 9));
    }

    #[test]
    fn materials_outside_the_catalog_get_a_generic_description() {
        let h = history(42, &[3.0; 15], 5.0);
        let result = ForecastEngine::new().forecast(&h, &request(42, 3)).unwrap();
        assert_eq!(result.material.name, "Material 42");
        assert_eq!(result.material.unit, "units");
        assert!(result.seasonality_pattern.is_none());
    }

    #[test]
    fn request_validation() {
        let ok = FeatureMap::new()
            .with("material_id", 3.0)
            .with("forecast_days", 30.0)
            .with("current_stock", 500.0)
            .with("reorder_point", 800.0)
            .with("lead_time_days", 2.0);
        let req = ForecastRequest::from_features(ok.clone()).unwrap();
        assert_eq!(req.material_id, MaterialId(3));

        let fractional = ok.clone().with("forecast_days", 2.5);
        assert!(matches!(
            ForecastRequest::from_features(fractional),
            Err(DomainError::Validation(_))
        ));
        let negative = ok.with("current_stock", -1.0);
        assert!(matches!(
            ForecastRequest::from_features(negative),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(
            ForecastRequest::from_features(FeatureMap::new().with("material_id", 1.0)).unwrap_err(),
            DomainError::missing_feature("forecast_days")
        );
    }

    #[test]
    fn overview_flags_low_cover() {
        let mut h = history(1, &[10.0; 10], 30.0); // 3 days of cover
        h.extend(history(2, &[10.0; 10], 100.0)); // 10 days
        h.extend(history(3, &[10.0; 10], 500.0)); // 50 days
        h.extend(history(4, &[0.0; 10], 7.0)); // no demand

        let overview = inventory_overview(&h);
        assert_eq!(overview.materials_analyzed, 4);
        assert_eq!(overview.summary.items_at_risk, 1);
        assert_eq!(overview.summary.items_below_reorder, 1);
        assert!(matches!(
            overview.alerts[0],
            InventoryAlert::StockoutImminent { material_id: MaterialId(1), .. }
        ));
        assert_eq!(overview.materials[3].stock_days, UNBOUNDED_STOCK_DAYS);
        assert_eq!(
            overview.summary.total_inventory_value,
            30.0 * 185.5 + 100.0 * 18_500.0 + 500.0 * 12.5 + 7.0 * 350.0
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        #[test]
        fn simulated_stock_never_goes_negative(
            current in 0.0f64..10_000.0,
            demand in prop::collection::vec(0.0f64..500.0, 0..120),
        ) {
            let stock = simulate_stock(current, &demand);
            prop_assert_eq!(stock.len(), demand.len());
            prop_assert!(stock.iter().all(|s| *s >= 0.0));
            prop_assert!(stock.windows(2).all(|w| w[1] <= w[0]));
        }

        #[test]
        fn stockout_day_points_at_the_first_empty_day(
            current in 0.0f64..1_000.0,
            demand in prop::collection::vec(0.0f64..200.0, 1..60),
        ) {
            let stock = simulate_stock(current, &demand);
            match stockout_day(&stock) {
                Some(day) => {
                    let i = day as usize - 1;
                    prop_assert!(stock[i] <= 0.0);
                    prop_assert!(stock[..i].iter().all(|s| *s > 0.0));
                }
                None => prop_assert!(stock.iter().all(|s| *s > 0.0)),
            }
        }

        #[test]
        fn safety_stock_grows_with_lead_time(mae in 0.0f64..100.0, lead in 0u32..60) {
            prop_assert!(safety_stock(mae, lead) >= 0.0);
            prop_assert!(safety_stock(mae, lead + 1) >= safety_stock(mae, lead));
        }

        #[test]
        fn recommended_order_is_never_negative(
            total in 0.0f64..1e6,
            safety in 0.0f64..1e4,
            current in 0.0f64..1e6,
            reorder in 0.0f64..1e4,
        ) {
            prop_assert!(recommended_order(total, safety, current, reorder) >= 0.0);
        }
    }
}
