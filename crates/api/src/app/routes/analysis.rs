use serde_json::{Value, json};

use forgeml_core::DomainResult;
use forgeml_infra::prediction;

use crate::app::routes::storage;
use crate::app::services::AppServices;

pub fn customer_segments(services: &AppServices) -> DomainResult<Value> {
    let set = services.lifecycle.models()?;
    let customers = services.lifecycle.datasets().customers().map_err(storage)?;
    let a = prediction::analyze_customer_segments(&set.customer_segments, &customers)?;
    Ok(json!({
        "analysis": {
            "total_customers": a.total_customers,
            "num_clusters": a.num_clusters,
            "silhouette_score": a.silhouette_score,
        },
        "segments": a.segments,
    }))
}

pub fn turnover_overview(services: &AppServices) -> DomainResult<Value> {
    let set = services.lifecycle.models()?;
    let employees = services.lifecycle.datasets().employees().map_err(storage)?;
    let overview = prediction::turnover_overview(&set.employee_turnover, &employees)?;
    Ok(json!({ "overview": overview }))
}

pub fn inventory_overview(services: &AppServices) -> DomainResult<Value> {
    // Initialization also produces the inventory history on first run.
    services.lifecycle.models()?;
    let history = services.lifecycle.datasets().inventory().map_err(storage)?;
    Ok(json!(forgeml_infra::inventory_overview(&history)))
}
