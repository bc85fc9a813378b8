use serde_json::{Value, json};

use forgeml_core::DomainResult;
use forgeml_infra::ForecastRequest;

use crate::app::dto;
use crate::app::routes::{features, storage};
use crate::app::services::AppServices;

/// Demand forecast for one material over the stored inventory history.
pub fn inventory(services: &AppServices, body: &Value) -> DomainResult<Value> {
    let request = ForecastRequest::from_features(features(body)?)?;
    services.lifecycle.models()?;
    let history = services.lifecycle.datasets().inventory().map_err(storage)?;
    let result = services.forecaster.forecast(&history, &request)?;

    let outlook = dto::ForecastOutlook {
        summary: &result.forecast,
        dates: dto::reorder_dates(
            services.today(),
            result.forecast.days_until_stockout,
            request.lead_time_days,
        ),
    };
    Ok(json!({
        "material": result.material,
        "forecast": outlook,
        "model_info": result.model_info,
        "daily_forecast": result.daily_forecast,
        "seasonality_pattern": result.seasonality_pattern,
    }))
}
