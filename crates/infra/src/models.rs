//! Trained model bundles: artifact, optional scaler and metrics record.
//!
//! A [`ModelSet`] holds all four models of one training run and is never
//! mutated after construction; the lifecycle manager swaps whole sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgeml_ai::{
    GradientBoostingRegressor, KMeans, LogisticRegression, RandomForestRegressor, StandardScaler,
};
use forgeml_core::{ModelName, RunId};
use forgeml_datagen::CustomerRecord;

/// A fitted estimator bound to the feature order it was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact<M> {
    pub model_name: ModelName,
    pub estimator: String,
    pub feature_names: Vec<String>,
    /// Whether inputs must go through the companion scaler.
    pub scaled: bool,
    pub model: M,
}

impl<M> Artifact<M> {
    pub fn new(model_name: ModelName, feature_names: &[&str], model: M) -> Self {
        Self {
            model_name,
            estimator: model_name.estimator().to_string(),
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
            scaled: model_name.uses_scaler(),
            model,
        }
    }
}

/// Evaluation output of one training run for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord<X> {
    pub run_id: RunId,
    pub trained_at: DateTime<Utc>,
    pub model: ModelName,
    pub estimator: String,
    #[serde(flatten)]
    pub values: X,
}

impl<X> MetricsRecord<X> {
    pub fn new(run_id: RunId, model: ModelName, values: X) -> Self {
        Self {
            run_id,
            trained_at: Utc::now(),
            model,
            estimator: model.estimator().to_string(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub weight: f64,
}

/// Pair `feature_names` with `weights`, rounded to 4 decimals, heaviest first.
pub fn ranked_weights(feature_names: &[&str], weights: &[f64]) -> Vec<FeatureWeight> {
    let mut out: Vec<FeatureWeight> = feature_names
        .iter()
        .zip(weights)
        .map(|(name, w)| FeatureWeight {
            feature: name.to_string(),
            weight: round_to(*w, 4),
        })
        .collect();
    out.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub r2_score: f64,
    pub mae: f64,
    pub rmse: f64,
    pub feature_importance: Vec<FeatureWeight>,
}

/// Mean customer profile of a group of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentCharacteristics {
    pub avg_revenue: f64,
    pub avg_projects: f64,
    pub avg_tenure_months: f64,
    pub avg_payment_delay: f64,
    pub avg_satisfaction: f64,
}

impl SegmentCharacteristics {
    /// Averages over `rows`; all zero when `rows` is empty.
    pub fn of(rows: &[&CustomerRecord]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let n = rows.len() as f64;
        let avg = |f: fn(&CustomerRecord) -> f64| rows.iter().map(|r| f(r)).sum::<f64>() / n;
        Self {
            avg_revenue: round_to(avg(|r| r.total_revenue), 2),
            avg_projects: round_to(avg(|r| f64::from(r.num_projects)), 1),
            avg_tenure_months: round_to(avg(|r| f64::from(r.months_as_customer)), 1),
            avg_payment_delay: round_to(avg(|r| r.payment_delay_avg_days), 1),
            avg_satisfaction: round_to(avg(|r| r.communication_score), 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStat {
    pub cluster_id: usize,
    pub count: usize,
    pub percentage: f64,
    #[serde(flatten)]
    pub characteristics: SegmentCharacteristics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringMetrics {
    pub silhouette_score: f64,
    pub n_clusters: usize,
    pub cluster_stats: Vec<ClusterStat>,
    pub feature_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub auc_roc: f64,
    /// Coefficients in training order (not sorted).
    pub coefficients: Vec<FeatureWeight>,
    pub feature_names: Vec<String>,
}

/// Artifact, scaler and metrics of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel<M, X> {
    pub artifact: Artifact<M>,
    pub scaler: Option<StandardScaler>,
    pub metrics: MetricsRecord<X>,
}

impl<M, X> TrainedModel<M, X> {
    pub fn name(&self) -> ModelName {
        self.artifact.model_name
    }

    pub fn run_id(&self) -> RunId {
        self.metrics.run_id
    }
}

pub type CostModel = TrainedModel<RandomForestRegressor, RegressionMetrics>;
pub type DurationModel = TrainedModel<GradientBoostingRegressor, RegressionMetrics>;
pub type SegmentModel = TrainedModel<KMeans, ClusteringMetrics>;
pub type TurnoverModel = TrainedModel<LogisticRegression, ClassificationMetrics>;

/// The four models of one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSet {
    pub project_cost: CostModel,
    pub project_duration: DurationModel,
    pub customer_segments: SegmentModel,
    pub employee_turnover: TurnoverModel,
}

impl ModelSet {
    /// Metrics of every model as JSON, keyed by model name.
    pub fn all_metrics(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut out = serde_json::Map::new();
        let entries = [
            (ModelName::ProjectCost, serde_json::to_value(&self.project_cost.metrics)),
            (ModelName::ProjectDuration, serde_json::to_value(&self.project_duration.metrics)),
            (ModelName::CustomerSegments, serde_json::to_value(&self.customer_segments.metrics)),
            (ModelName::EmployeeTurnover, serde_json::to_value(&self.employee_turnover.metrics)),
        ];
        for (name, value) in entries {
            out.insert(
                name.as_str().to_string(),
                value.unwrap_or(serde_json::Value::Null),
            );
        }
        out
    }
}

pub(crate) fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}
