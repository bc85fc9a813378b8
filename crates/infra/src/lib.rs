//! Infrastructure layer: artifact and dataset storage, training, the model
//! lifecycle, and the inference paths that read from it.

pub mod config;
pub mod forecasting;
pub mod lifecycle;
pub mod models;
pub mod prediction;
pub mod store;
pub mod training;

#[cfg(test)]
mod integration_tests;

pub use config::{AnalyticsConfig, ConfigError, LogFormat, TrainingConfig};
pub use forecasting::{ForecastEngine, ForecastRequest, ForecastResult, InventoryOverview, inventory_overview};
pub use lifecycle::{DatasetCounts, HealthReport, InitOutcome, LifecycleState, ModelLifecycleManager};
pub use models::ModelSet;
pub use store::{BlobStore, DatasetStore, FsBlobStore, InMemoryBlobStore, ModelStore, StoreError};
pub use training::Trainer;
