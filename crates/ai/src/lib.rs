//! `forgeml-ai`
//!
//! **Responsibility:** estimators and evaluation used by the analytics service.
//!
//! This crate is intentionally storage- and domain-agnostic:
//! - It works on plain `f64` matrices and vectors; callers own feature order.
//! - Every stochastic step takes an explicit seed.
//! - Fitted estimators are immutable and serde-serializable so they can be
//!   persisted as artifacts and shared across threads.

pub mod arima;
pub mod boosting;
pub mod forecast;
pub mod forest;
pub mod kmeans;
pub mod linalg;
pub mod logistic;
pub mod metrics;
pub mod model;
pub mod moving_average;
pub mod optimize;
pub mod result;
pub mod scaler;
pub mod split;
pub mod stats;
pub mod tree;

pub use arima::{ARIMA_LABEL, Arima};
pub use boosting::{BoostingParams, GradientBoostingRegressor};
pub use forecast::{SeriesForecast, Z_95};
pub use forest::{ForestParams, RandomForestRegressor};
pub use kmeans::{KMeans, KMeansParams};
pub use logistic::{LogisticParams, LogisticRegression};
pub use model::Regressor;
pub use moving_average::MovingAverageForecaster;
pub use result::{AiError, AiResult};
pub use scaler::StandardScaler;
pub use split::{Split, stratified_split, train_test_split};
pub use tree::{RegressionTree, TreeParams};
