use serde_json::{Value, json};

use forgeml_core::DomainResult;
use forgeml_infra::prediction::{
    predict_employee_turnover, predict_project_cost, predict_project_duration,
};

use crate::app::dto;
use crate::app::routes::features;
use crate::app::services::AppServices;

pub fn project_cost(services: &AppServices, body: &Value) -> DomainResult<Value> {
    let features = features(body)?;
    let set = services.lifecycle.models()?;
    let p = predict_project_cost(&set.project_cost, features)?;
    Ok(json!({
        "prediction": {
            "predicted_cost": p.predicted_cost,
            "confidence_interval": p.confidence_interval,
            "confidence_level": p.confidence_level,
        },
        "model_info": p.model_info,
    }))
}

pub fn project_duration(services: &AppServices, body: &Value) -> DomainResult<Value> {
    let features = features(body)?;
    let set = services.lifecycle.models()?;
    let p = predict_project_duration(&set.project_duration, features)?;
    Ok(json!({
        "prediction": {
            "predicted_days": p.predicted_days,
            "predicted_months": p.predicted_months,
            "confidence_interval": p.confidence_interval,
            "confidence_level": p.confidence_level,
            "estimated_end_date": dto::estimated_end_date(services.today(), p.predicted_days),
        },
        "model_info": p.model_info,
    }))
}

pub fn employee_turnover(services: &AppServices, body: &Value) -> DomainResult<Value> {
    let features = features(body)?;
    let set = services.lifecycle.models()?;
    let p = predict_employee_turnover(&set.employee_turnover, features)?;
    Ok(json!({
        "prediction": {
            "turnover_probability": p.turnover_probability,
            "risk_level": p.risk_level,
            "risk_color": p.risk_color,
            "recommendation": dto::turnover_recommendation(p.risk_level),
        },
        "risk_factors": p.risk_factors,
        "model_info": p.model_info,
    }))
}
