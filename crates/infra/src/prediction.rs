//! Prediction service: stateless inference over a loaded [`ModelSet`].
//!
//! Every entry point resolves the caller's feature map against the operation
//! schema first, then builds the feature vector in the order recorded on the
//! artifact. Scaled models go through their companion scaler; unscaled ones
//! never do.
//!
//! [`ModelSet`]: crate::models::ModelSet

use serde::Serialize;

use forgeml_ai::stats::{mean, std_dev};
use forgeml_ai::{AiError, Regressor, StandardScaler, Z_95};
use forgeml_core::{
    DomainError, DomainResult, EMPLOYEE_TURNOVER_SCHEMA, FeatureMap, ModelName,
    PROJECT_COST_SCHEMA, PROJECT_DURATION_SCHEMA,
};
use forgeml_datagen::project::MIN_DURATION_DAYS;
use forgeml_datagen::{CustomerRecord, EmployeeRecord};

use crate::models::{
    Artifact, CostModel, DurationModel, FeatureWeight, SegmentCharacteristics, SegmentModel,
    TurnoverModel, round_to,
};

/// Width multiplier of the duration interval, in training MAEs.
pub const DURATION_INTERVAL_MAES: f64 = 1.5;
/// Fallback MAE (days) when the metrics record carries none.
pub const DEFAULT_DURATION_MAE_DAYS: f64 = 15.0;
pub const DURATION_CONFIDENCE_LEVEL: f64 = 0.80;

pub const RISK_THRESHOLDS: (f64, f64) = (0.3, 0.6);
/// Divisor turning coefficient × raw value into a contribution score.
pub const CONTRIBUTION_SCALE: f64 = 10.0;
pub const MIN_CONTRIBUTION: f64 = 0.05;
pub const MAX_RISK_FACTORS: usize = 5;

/// Business names and colours of the revenue-ranked segments.
pub const SEGMENT_LABELS: [(&str, &str); 4] = [
    ("VIP", "#FFD700"),
    ("Frequent", "#4CAF50"),
    ("Sporadic", "#FF9800"),
    ("New", "#2196F3"),
];

fn inference_error(model: ModelName) -> impl Fn(AiError) -> DomainError {
    move |e| DomainError::missing_artifact(format!("{model}: {e}"))
}

/// Feature vector in artifact order, scaled when the artifact requires it.
fn model_input<M>(
    artifact: &Artifact<M>,
    scaler: Option<&StandardScaler>,
    features: &FeatureMap,
) -> DomainResult<Vec<f64>> {
    let raw = features.vector_for(&artifact.feature_names)?;
    match (artifact.scaled, scaler) {
        (false, _) => Ok(raw),
        (true, Some(scaler)) => scaler
            .transform_row(&raw)
            .map_err(inference_error(artifact.model_name)),
        (true, None) => Err(DomainError::missing_artifact(format!(
            "{}: scaler not loaded",
            artifact.model_name
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostInterval {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostModelInfo {
    pub name: String,
    pub r2_score: f64,
    pub mae: f64,
    pub rmse: f64,
    pub feature_importance: Vec<FeatureWeight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostPrediction {
    pub predicted_cost: f64,
    pub confidence_interval: CostInterval,
    pub confidence_level: f64,
    pub model_info: CostModelInfo,
}

/// Mean and spread of the per-tree estimates.
///
/// The interval is `mean ± 1.96·std` with the lower bound floored at zero;
/// confidence is `1 - std/mean`, or zero when the mean is not positive.
pub fn ensemble_estimate(per_tree: &[f64]) -> (f64, CostInterval, f64) {
    let mu = mean(per_tree);
    let sd = std_dev(per_tree);
    let interval = CostInterval {
        lower: round_to((mu - Z_95 * sd).max(0.0), 2),
        upper: round_to(mu + Z_95 * sd, 2),
    };
    let confidence = if mu > 0.0 { round_to(1.0 - sd / mu, 2) } else { 0.0 };
    (round_to(mu, 2), interval, confidence)
}

pub fn predict_project_cost(model: &CostModel, features: FeatureMap) -> DomainResult<CostPrediction> {
    let features = PROJECT_COST_SCHEMA.resolve(features)?;
    let row = model_input(&model.artifact, model.scaler.as_ref(), &features)?;
    let per_tree = model
        .artifact
        .model
        .predict_each(&row)
        .map_err(inference_error(model.name()))?;
    let (predicted_cost, confidence_interval, confidence_level) = ensemble_estimate(&per_tree);

    let m = &model.metrics.values;
    Ok(CostPrediction {
        predicted_cost,
        confidence_interval,
        confidence_level,
        model_info: CostModelInfo {
            name: model.artifact.estimator.clone(),
            r2_score: m.r2_score,
            mae: m.mae,
            rmse: m.rmse,
            feature_importance: m.feature_importance.clone(),
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationInterval {
    pub lower_days: u32,
    pub upper_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationModelInfo {
    pub name: String,
    pub r2_score: f64,
    pub mae_days: f64,
    pub rmse_days: f64,
    pub feature_importance: Vec<FeatureWeight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationPrediction {
    pub predicted_days: u32,
    pub predicted_months: f64,
    pub confidence_interval: DurationInterval,
    pub confidence_level: f64,
    pub model_info: DurationModelInfo,
}

/// `±1.5·MAE` around the estimate, lower bound at least the minimum duration.
pub fn duration_interval(predicted_days: f64, mae_days: f64) -> DurationInterval {
    let mae = if mae_days.is_finite() && mae_days > 0.0 {
        mae_days
    } else {
        DEFAULT_DURATION_MAE_DAYS
    };
    let lower = (predicted_days - DURATION_INTERVAL_MAES * mae).max(MIN_DURATION_DAYS);
    let upper = (predicted_days + DURATION_INTERVAL_MAES * mae).max(lower);
    DurationInterval {
        lower_days: lower as u32,
        upper_days: upper as u32,
    }
}

pub fn predict_project_duration(
    model: &DurationModel,
    features: FeatureMap,
) -> DomainResult<DurationPrediction> {
    let features = PROJECT_DURATION_SCHEMA.resolve(features)?;
    let row = model_input(&model.artifact, model.scaler.as_ref(), &features)?;
    let days = model
        .artifact
        .model
        .predict_row(&row)
        .map_err(inference_error(model.name()))?
        .max(0.0);

    let m = &model.metrics.values;
    Ok(DurationPrediction {
        predicted_days: days.round() as u32,
        predicted_months: round_to(days / 30.0, 1),
        confidence_interval: duration_interval(days, m.mae),
        confidence_level: DURATION_CONFIDENCE_LEVEL,
        model_info: DurationModelInfo {
            name: model.artifact.estimator.clone(),
            r2_score: m.r2_score,
            mae_days: m.mae,
            rmse_days: m.rmse,
            feature_importance: m.feature_importance.clone(),
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(p: f64) -> Self {
        if p < RISK_THRESHOLDS.0 {
            RiskLevel::Low
        } else if p < RISK_THRESHOLDS.1 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    /// Impact bucket of a factor contribution.
    pub fn from_contribution(c: f64) -> Self {
        if c.abs() > 0.15 {
            RiskLevel::High
        } else if c.abs() > 0.08 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskLevel::Low => "#4CAF50",
            RiskLevel::Medium => "#FF9800",
            RiskLevel::High => "#F44336",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFactor {
    pub factor: String,
    pub impact: RiskLevel,
    pub value: f64,
    pub contribution: f64,
}

/// Features pushing turnover risk up, strongest first, at most five.
///
/// `values` are the caller's raw (unscaled) values in `names` order.
pub fn risk_factors(names: &[String], coefficients: &[f64], values: &[f64]) -> Vec<RiskFactor> {
    let mut factors: Vec<RiskFactor> = names
        .iter()
        .zip(coefficients)
        .zip(values)
        .filter(|((_, coef), _)| **coef > 0.0)
        .filter_map(|((name, coef), value)| {
            let contribution = coef * value / CONTRIBUTION_SCALE;
            (contribution > MIN_CONTRIBUTION).then(|| RiskFactor {
                factor: name.clone(),
                impact: RiskLevel::from_contribution(contribution),
                value: *value,
                contribution: round_to(contribution, 3),
            })
        })
        .collect();
    factors.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
    factors.truncate(MAX_RISK_FACTORS);
    factors
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierInfo {
    pub name: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub auc_roc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnoverPrediction {
    pub turnover_probability: f64,
    pub risk_level: RiskLevel,
    pub risk_color: &'static str,
    pub risk_factors: Vec<RiskFactor>,
    pub model_info: ClassifierInfo,
}

fn turnover_probability(model: &TurnoverModel, features: &FeatureMap) -> DomainResult<f64> {
    let row = model_input(&model.artifact, model.scaler.as_ref(), features)?;
    model
        .artifact
        .model
        .predict_proba(&row)
        .map_err(inference_error(model.name()))
}

pub fn predict_employee_turnover(
    model: &TurnoverModel,
    features: FeatureMap,
) -> DomainResult<TurnoverPrediction> {
    let features = EMPLOYEE_TURNOVER_SCHEMA.resolve(features)?;
    let probability = turnover_probability(model, &features)?;
    let risk_level = RiskLevel::from_probability(probability);

    let raw = features.vector_for(&model.artifact.feature_names)?;
    let m = &model.metrics.values;
    Ok(TurnoverPrediction {
        turnover_probability: round_to(probability, 3),
        risk_level,
        risk_color: risk_level.color(),
        risk_factors: risk_factors(
            &model.artifact.feature_names,
            model.artifact.model.coefficients(),
            &raw,
        ),
        model_info: ClassifierInfo {
            name: model.artifact.estimator.clone(),
            accuracy: m.accuracy,
            precision: m.precision,
            recall: m.recall,
            f1_score: m.f1_score,
            auc_roc: m.auc_roc,
        },
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnoverOverview {
    pub total_employees: usize,
    pub predicted_at_risk: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub overall_turnover_rate: f64,
}

/// Score every employee and count risk buckets.
pub fn turnover_overview(
    model: &TurnoverModel,
    employees: &[EmployeeRecord],
) -> DomainResult<TurnoverOverview> {
    let (mut low, mut medium, mut high) = (0, 0, 0);
    for e in employees {
        let features: FeatureMap = model
            .artifact
            .feature_names
            .iter()
            .map(String::as_str)
            .zip(e.features.to_vector())
            .collect();
        match RiskLevel::from_probability(turnover_probability(model, &features)?) {
            RiskLevel::Low => low += 1,
            RiskLevel::Medium => medium += 1,
            RiskLevel::High => high += 1,
        }
    }
    let left: Vec<f64> = employees
        .iter()
        .map(|e| if e.has_left { 1.0 } else { 0.0 })
        .collect();

    Ok(TurnoverOverview {
        total_employees: employees.len(),
        predicted_at_risk: high + medium,
        high_risk: high,
        medium_risk: medium,
        low_risk: low,
        overall_turnover_rate: round_to(mean(&left), 3),
    })
}

/// Raw cluster ids ordered by mean revenue of their members, highest first.
///
/// Empty clusters rank last; ties keep ascending id order.
pub fn rank_clusters(labels: &[usize], revenue: &[f64], n_clusters: usize) -> Vec<usize> {
    let mut sums = vec![(0.0, 0usize); n_clusters];
    for (&label, &r) in labels.iter().zip(revenue) {
        if let Some(slot) = sums.get_mut(label) {
            slot.0 += r;
            slot.1 += 1;
        }
    }
    let means: Vec<Option<f64>> = sums
        .iter()
        .map(|&(sum, n)| (n > 0).then(|| sum / n as f64))
        .collect();

    let mut order: Vec<usize> = (0..n_clusters).collect();
    order.sort_by(|&a, &b| match (means[a], means[b]) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    order
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Revenue rank, 0 = highest.
    pub segment_id: usize,
    pub original_cluster_id: usize,
    pub name: String,
    pub color: String,
    pub count: usize,
    pub percentage: f64,
    pub characteristics: SegmentCharacteristics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentAnalysis {
    pub total_customers: usize,
    pub num_clusters: usize,
    pub silhouette_score: f64,
    pub segments: Vec<Segment>,
}

fn segment_label(rank: usize) -> (String, String) {
    match SEGMENT_LABELS.get(rank) {
        Some((name, color)) => (name.to_string(), color.to_string()),
        None => (format!("Segment {}", rank + 1), "#9E9E9E".to_string()),
    }
}

/// Assign every customer to a cluster and label clusters by revenue rank.
pub fn analyze_customer_segments(
    model: &SegmentModel,
    customers: &[CustomerRecord],
) -> DomainResult<SegmentAnalysis> {
    let scaler = model.scaler.as_ref().ok_or_else(|| {
        DomainError::missing_artifact(format!("{}: scaler not loaded", model.name()))
    })?;
    let kmeans = &model.artifact.model;

    let mut labels = Vec::with_capacity(customers.len());
    for c in customers {
        let row = scaler
            .transform_row(&c.cluster_features())
            .map_err(inference_error(model.name()))?;
        labels.push(kmeans.predict(&row).map_err(inference_error(model.name()))?);
    }

    let revenue: Vec<f64> = customers.iter().map(|c| c.total_revenue).collect();
    let n_clusters = kmeans.n_clusters();
    let total = customers.len();

    let segments = rank_clusters(&labels, &revenue, n_clusters)
        .into_iter()
        .enumerate()
        .map(|(rank, cluster_id)| {
            let members: Vec<&CustomerRecord> = customers
                .iter()
                .zip(&labels)
                .filter(|(_, l)| **l == cluster_id)
                .map(|(c, _)| c)
                .collect();
            let (name, color) = segment_label(rank);
            let percentage = if total == 0 {
                0.0
            } else {
                round_to(members.len() as f64 / total as f64 * 100.0, 1)
            };
            Segment {
                segment_id: rank,
                original_cluster_id: cluster_id,
                name,
                color,
                count: members.len(),
                percentage,
                characteristics: SegmentCharacteristics::of(&members),
            }
        })
        .collect();

    Ok(SegmentAnalysis {
        total_customers: total,
        num_clusters: n_clusters,
        silhouette_score: model.metrics.values.silhouette_score,
        segments,
    })
}
