//! Request routing: one handler per operation, grouped by area.

use std::str::FromStr;

use serde_json::Value;

use forgeml_core::{DomainError, DomainResult, FeatureMap};
use forgeml_infra::StoreError;

use crate::app::errors::{self, ApiResponse};
use crate::app::services::AppServices;

pub mod analysis;
pub mod datasets;
pub mod forecast;
pub mod predictions;
pub mod system;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Route {
    Health,
    Dashboard,
    PredictProjectCost,
    PredictProjectDuration,
    PredictEmployeeTurnover,
    AnalyzeCustomerSegments,
    AnalyzeTurnoverOverview,
    AnalyzeInventoryOverview,
    ForecastInventory,
    RegenerateDatasets,
    RetrainModels,
}

impl Route {
    pub const ALL: [Route; 11] = [
        Route::Health,
        Route::Dashboard,
        Route::PredictProjectCost,
        Route::PredictProjectDuration,
        Route::PredictEmployeeTurnover,
        Route::AnalyzeCustomerSegments,
        Route::AnalyzeTurnoverOverview,
        Route::AnalyzeInventoryOverview,
        Route::ForecastInventory,
        Route::RegenerateDatasets,
        Route::RetrainModels,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Health => "health",
            Route::Dashboard => "dashboard",
            Route::PredictProjectCost => "predict/project-cost",
            Route::PredictProjectDuration => "predict/project-duration",
            Route::PredictEmployeeTurnover => "predict/employee-turnover",
            Route::AnalyzeCustomerSegments => "analyze/customer-segments",
            Route::AnalyzeTurnoverOverview => "analyze/turnover-overview",
            Route::AnalyzeInventoryOverview => "analyze/inventory-overview",
            Route::ForecastInventory => "forecast/inventory",
            Route::RegenerateDatasets => "datasets/regenerate",
            Route::RetrainModels => "datasets/retrain",
        }
    }
}

impl FromStr for Route {
    type Err = DomainError;

    /// Leading and trailing slashes are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim().trim_matches('/');
        Route::ALL
            .into_iter()
            .find(|r| r.path() == path)
            .ok_or_else(|| DomainError::unknown_entity("route", s))
    }
}

pub fn dispatch(services: &AppServices, route: Route, body: &Value) -> ApiResponse {
    let result = match route {
        Route::Health => Ok(system::health(services)),
        Route::Dashboard => system::dashboard(services),
        Route::PredictProjectCost => predictions::project_cost(services, body),
        Route::PredictProjectDuration => predictions::project_duration(services, body),
        Route::PredictEmployeeTurnover => predictions::employee_turnover(services, body),
        Route::AnalyzeCustomerSegments => analysis::customer_segments(services),
        Route::AnalyzeTurnoverOverview => analysis::turnover_overview(services),
        Route::AnalyzeInventoryOverview => analysis::inventory_overview(services),
        Route::ForecastInventory => forecast::inventory(services, body),
        Route::RegenerateDatasets => datasets::regenerate(services),
        Route::RetrainModels => datasets::retrain(services),
    };
    match result {
        Ok(payload) => errors::json_ok(payload),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Caller features from a JSON object body.
pub(crate) fn features(body: &Value) -> DomainResult<FeatureMap> {
    FeatureMap::from_json(body)
}

pub(crate) fn storage(e: StoreError) -> DomainError {
    DomainError::storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_round_trip_with_optional_slashes() {
        for route in Route::ALL {
            assert_eq!(route.path().parse::<Route>().unwrap(), route);
            assert_eq!(format!("/{}/", route.path()).parse::<Route>().unwrap(), route);
        }
        assert!(matches!(
            "predict/nothing".parse::<Route>(),
            Err(DomainError::UnknownEntity { kind: "route", .. })
        ));
    }
}
