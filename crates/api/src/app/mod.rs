//! API application wiring (routes + service wiring).
//!
//! This folder is structured like:
//! - `services.rs`: lifecycle manager, forecaster and clock wiring
//! - `routes/`: handlers (one file per area)
//! - `dto.rs`: response payload shapes
//! - `errors.rs`: consistent success/error envelopes

use std::sync::Arc;

use serde_json::Value;

use forgeml_core::DomainResult;
use forgeml_infra::AnalyticsConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use errors::ApiResponse;
pub use routes::Route;
pub use services::AppServices;

/// Build file-backed services from configuration (public entrypoint used by `main.rs`).
pub fn build_app(config: &AnalyticsConfig) -> DomainResult<Arc<AppServices>> {
    Ok(Arc::new(services::build_services(config)?))
}

/// Handle one request addressed by path (e.g. `predict/project-cost/`).
pub fn call(services: &AppServices, path: &str, body: &Value) -> ApiResponse {
    match path.parse::<Route>() {
        Ok(route) => routes::dispatch(services, route, body),
        Err(e) => errors::domain_error_to_response(e),
    }
}
