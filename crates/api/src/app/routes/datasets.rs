use serde_json::{Value, json};

use forgeml_core::DomainResult;

use crate::app::services::AppServices;

pub fn regenerate(services: &AppServices) -> DomainResult<Value> {
    let counts = services.lifecycle.regenerate_datasets()?;
    Ok(json!({
        "message": "Datasets regenerated successfully",
        "rows": counts,
    }))
}

pub fn retrain(services: &AppServices) -> DomainResult<Value> {
    let set = services.lifecycle.retrain()?;
    Ok(json!({
        "message": "All models retrained successfully",
        "run_id": set.project_cost.run_id(),
    }))
}
