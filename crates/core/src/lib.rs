//! `forgeml-core`: analytics domain building blocks.
//!
//! This crate contains **pure domain** primitives (no storage, no estimators):
//! the error taxonomy, identifiers, feature schemas and caller feature maps.

pub mod error;
pub mod features;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use features::{
    CUSTOMER_CLUSTER_FEATURES, EMPLOYEE_FEATURES, EMPLOYEE_TURNOVER_SCHEMA, FORECAST_REQUEST_FIELDS,
    FeatureMap, FeatureSchema, INVENTORY_FORECAST_SCHEMA, PROJECT_COST_SCHEMA,
    PROJECT_DURATION_SCHEMA, PROJECT_FEATURES,
};
pub use id::{MaterialId, ModelName, RunId};
