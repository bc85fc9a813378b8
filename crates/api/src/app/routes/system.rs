use chrono::Utc;
use serde_json::{Value, json};

use forgeml_core::DomainResult;
use forgeml_infra::LifecycleState;

use crate::app::dto;
use crate::app::services::AppServices;

/// Liveness plus per-model load flags. Never blocks on initialization.
pub fn health(services: &AppServices) -> Value {
    let report = services.lifecycle.health();
    let status = if report.state == LifecycleState::Ready {
        "operational"
    } else {
        "starting"
    };
    json!({
        "service": "forgeml-analytics",
        "version": env!("CARGO_PKG_VERSION"),
        "status": status,
        "state": report.state,
        "run_id": report.run_id,
        "models_loaded": report.models_loaded,
        "timestamp": Utc::now(),
    })
}

pub fn dashboard(services: &AppServices) -> DomainResult<Value> {
    let set = services.lifecycle.models()?;
    Ok(json!({
        "models_status": dto::models_status(&set),
        "all_metrics": set.all_metrics(),
    }))
}
