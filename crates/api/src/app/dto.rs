use chrono::{Duration, NaiveDate};
use serde::Serialize;

use forgeml_infra::ModelSet;
use forgeml_infra::forecasting::ForecastSummary;
use forgeml_infra::prediction::RiskLevel;

// -------------------------
// Dashboard
// -------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub name: &'static str,
    pub model: &'static str,
    pub status: &'static str,
    /// Headline quality metric, e.g. `R²: 0.91`.
    pub accuracy: String,
}

/// One entry per model; the forecaster fits per request and is always active.
pub fn models_status(set: &ModelSet) -> Vec<ModelStatus> {
    vec![
        ModelStatus {
            name: "Project Cost Prediction",
            model: "Random Forest",
            status: "active",
            accuracy: format!("R²: {}", set.project_cost.metrics.values.r2_score),
        },
        ModelStatus {
            name: "Project Duration Prediction",
            model: "Gradient Boosting",
            status: "active",
            accuracy: format!("R²: {}", set.project_duration.metrics.values.r2_score),
        },
        ModelStatus {
            name: "Customer Segmentation",
            model: "K-Means",
            status: "active",
            accuracy: format!(
                "Silhouette: {}",
                set.customer_segments.metrics.values.silhouette_score
            ),
        },
        ModelStatus {
            name: "Employee Turnover",
            model: "Logistic Regression",
            status: "active",
            accuracy: format!("AUC: {}", set.employee_turnover.metrics.values.auc_roc),
        },
        ModelStatus {
            name: "Inventory Forecast",
            model: "ARIMA",
            status: "active",
            accuracy: "Dynamic".to_string(),
        },
    ]
}

// -------------------------
// Derived calendar fields
// -------------------------

/// Projected completion for a project starting `today`.
pub fn estimated_end_date(today: NaiveDate, predicted_days: u32) -> NaiveDate {
    today + Duration::days(i64::from(predicted_days))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReorderDates {
    pub stockout_date: Option<NaiveDate>,
    /// Stockout minus lead time minus a two-day margin, never before `today`.
    pub recommended_order_date: Option<NaiveDate>,
}

pub fn reorder_dates(today: NaiveDate, days_until_stockout: Option<u32>, lead_time_days: u32) -> ReorderDates {
    match days_until_stockout {
        Some(days) => {
            let order_in = i64::from(days) - i64::from(lead_time_days) - 2;
            ReorderDates {
                stockout_date: Some(today + Duration::days(i64::from(days))),
                recommended_order_date: Some(today + Duration::days(order_in.max(0))),
            }
        }
        None => ReorderDates {
            stockout_date: None,
            recommended_order_date: None,
        },
    }
}

/// Forecast summary extended with calendar dates relative to the request day.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastOutlook<'a> {
    #[serde(flatten)]
    pub summary: &'a ForecastSummary,
    #[serde(flatten)]
    pub dates: ReorderDates,
}

pub fn turnover_recommendation(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "Immediate action required",
        RiskLevel::Medium => "Monitor closely",
        RiskLevel::Low => "No action required",
    }
}
