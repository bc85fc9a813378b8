//! Training routines for the four persisted models.
//!
//! Each routine fits one estimator on its dataset, evaluates it on a seeded
//! hold-out split (segmentation is evaluated in-sample) and returns the
//! artifact, scaler and metrics as a [`TrainedModel`].

use std::time::Instant;

use tracing::info;

use forgeml_ai::metrics::{
    Confusion, mean_absolute_error, r2_score, roc_auc, root_mean_squared_error, silhouette_score,
};
use forgeml_ai::{
    AiError, GradientBoostingRegressor, KMeans, LogisticRegression, RandomForestRegressor,
    Regressor, Split, StandardScaler, stratified_split, train_test_split,
};
use forgeml_core::{
    CUSTOMER_CLUSTER_FEATURES, DomainError, DomainResult, EMPLOYEE_FEATURES, ModelName,
    PROJECT_FEATURES, RunId,
};
use forgeml_datagen::{CustomerRecord, DatasetBundle, EmployeeRecord, ProjectRecord};

use crate::config::TrainingConfig;
use crate::models::{
    Artifact, ClassificationMetrics, ClusterStat, ClusteringMetrics, CostModel, DurationModel,
    FeatureWeight, MetricsRecord, ModelSet, RegressionMetrics, SegmentCharacteristics,
    SegmentModel, TrainedModel, TurnoverModel, ranked_weights, round_to,
};

fn training_error(model: ModelName) -> impl Fn(AiError) -> DomainError {
    move |e| DomainError::training(format!("{model}: {e}"))
}

fn regression_metrics(
    model: &dyn Regressor,
    x_test: &[Vec<f64>],
    y_test: &[f64],
    importances: &[f64],
    error_decimals: i32,
) -> Result<RegressionMetrics, AiError> {
    let predicted = model.predict(x_test)?;
    Ok(RegressionMetrics {
        r2_score: round_to(r2_score(y_test, &predicted), 4),
        mae: round_to(mean_absolute_error(y_test, &predicted), error_decimals),
        rmse: round_to(root_mean_squared_error(y_test, &predicted), error_decimals),
        feature_importance: ranked_weights(&PROJECT_FEATURES, importances),
    })
}

/// Fits all models of a training run with one [`TrainingConfig`].
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train in the fixed order cost, duration, segments, turnover. All
    /// metrics records share one run id.
    pub fn train_all(&self, data: &DatasetBundle) -> DomainResult<ModelSet> {
        let run_id = RunId::new();
        info!(%run_id, "training run started");
        Ok(ModelSet {
            project_cost: self.train_project_cost(run_id, &data.projects)?,
            project_duration: self.train_project_duration(run_id, &data.projects)?,
            customer_segments: self.train_customer_segments(run_id, &data.customers)?,
            employee_turnover: self.train_employee_turnover(run_id, &data.employees)?,
        })
    }

    fn project_split(&self, projects: &[ProjectRecord]) -> Result<(Vec<Vec<f64>>, Split), AiError> {
        let x: Vec<Vec<f64>> = projects.iter().map(|p| p.features.to_vector()).collect();
        let split = train_test_split(x.len(), self.config.test_fraction, self.config.seed)?;
        Ok((x, split))
    }

    pub fn train_project_cost(
        &self,
        run_id: RunId,
        projects: &[ProjectRecord],
    ) -> DomainResult<CostModel> {
        let name = ModelName::ProjectCost;
        let started = Instant::now();
        let fit = || -> Result<CostModel, AiError> {
            let (x, split) = self.project_split(projects)?;
            let y: Vec<f64> = projects.iter().map(|p| p.actual_cost).collect();
            let forest = RandomForestRegressor::fit(
                &Split::select(&x, &split.train),
                &Split::select(&y, &split.train),
                self.config.forest,
            )?;
            let metrics = regression_metrics(
                &forest,
                &Split::select(&x, &split.test),
                &Split::select(&y, &split.test),
                &forest.feature_importances(),
                2,
            )?;
            Ok(TrainedModel {
                artifact: Artifact::new(name, &PROJECT_FEATURES, forest),
                scaler: None,
                metrics: MetricsRecord::new(run_id, name, metrics),
            })
        };
        let model = fit().map_err(training_error(name))?;
        info!(
            model = %name,
            r2 = model.metrics.values.r2_score,
            mae = model.metrics.values.mae,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model trained"
        );
        Ok(model)
    }

    pub fn train_project_duration(
        &self,
        run_id: RunId,
        projects: &[ProjectRecord],
    ) -> DomainResult<DurationModel> {
        let name = ModelName::ProjectDuration;
        let started = Instant::now();
        let fit = || -> Result<DurationModel, AiError> {
            let (x, split) = self.project_split(projects)?;
            let y: Vec<f64> = projects
                .iter()
                .map(|p| f64::from(p.actual_duration_days))
                .collect();
            let boosting = GradientBoostingRegressor::fit(
                &Split::select(&x, &split.train),
                &Split::select(&y, &split.train),
                self.config.boosting,
            )?;
            let metrics = regression_metrics(
                &boosting,
                &Split::select(&x, &split.test),
                &Split::select(&y, &split.test),
                &boosting.feature_importances(),
                1,
            )?;
            Ok(TrainedModel {
                artifact: Artifact::new(name, &PROJECT_FEATURES, boosting),
                scaler: None,
                metrics: MetricsRecord::new(run_id, name, metrics),
            })
        };
        let model = fit().map_err(training_error(name))?;
        info!(
            model = %name,
            r2 = model.metrics.values.r2_score,
            mae_days = model.metrics.values.mae,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model trained"
        );
        Ok(model)
    }

    /// K-means on all customers (no hold-out); silhouette on the scaled data.
    pub fn train_customer_segments(
        &self,
        run_id: RunId,
        customers: &[CustomerRecord],
    ) -> DomainResult<SegmentModel> {
        let name = ModelName::CustomerSegments;
        let started = Instant::now();
        let fit = || -> Result<SegmentModel, AiError> {
            let x: Vec<Vec<f64>> = customers.iter().map(|c| c.cluster_features()).collect();
            let scaler = StandardScaler::fit(&x)?;
            let scaled = scaler.transform(&x)?;
            let kmeans = KMeans::fit(&scaled, self.config.kmeans)?;
            let labels = scaled
                .iter()
                .map(|row| kmeans.predict(row))
                .collect::<Result<Vec<_>, _>>()?;

            let cluster_stats = (0..kmeans.n_clusters())
                .map(|cluster_id| {
                    let members: Vec<&CustomerRecord> = customers
                        .iter()
                        .zip(&labels)
                        .filter(|(_, l)| **l == cluster_id)
                        .map(|(c, _)| c)
                        .collect();
                    ClusterStat {
                        cluster_id,
                        count: members.len(),
                        percentage: round_to(
                            members.len() as f64 / customers.len() as f64 * 100.0,
                            1,
                        ),
                        characteristics: SegmentCharacteristics::of(&members),
                    }
                })
                .collect();

            let metrics = ClusteringMetrics {
                silhouette_score: round_to(silhouette_score(&scaled, &labels), 4),
                n_clusters: kmeans.n_clusters(),
                cluster_stats,
                feature_names: CUSTOMER_CLUSTER_FEATURES.iter().map(|s| s.to_string()).collect(),
            };
            Ok(TrainedModel {
                artifact: Artifact::new(name, &CUSTOMER_CLUSTER_FEATURES, kmeans),
                scaler: Some(scaler),
                metrics: MetricsRecord::new(run_id, name, metrics),
            })
        };
        let model = fit().map_err(training_error(name))?;
        info!(
            model = %name,
            silhouette = model.metrics.values.silhouette_score,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model trained"
        );
        Ok(model)
    }

    /// Scaler fitted on every row, then a stratified hold-out split.
    pub fn train_employee_turnover(
        &self,
        run_id: RunId,
        employees: &[EmployeeRecord],
    ) -> DomainResult<TurnoverModel> {
        let name = ModelName::EmployeeTurnover;
        let started = Instant::now();
        let fit = || -> Result<TurnoverModel, AiError> {
            let x: Vec<Vec<f64>> = employees.iter().map(|e| e.features.to_vector()).collect();
            let y: Vec<bool> = employees.iter().map(|e| e.has_left).collect();
            let scaler = StandardScaler::fit(&x)?;
            let scaled = scaler.transform(&x)?;
            let split = stratified_split(&y, self.config.test_fraction, self.config.seed)?;

            let model = LogisticRegression::fit(
                &Split::select(&scaled, &split.train),
                &Split::select(&y, &split.train),
                self.config.logistic,
            )?;

            let x_test = Split::select(&scaled, &split.test);
            let y_test = Split::select(&y, &split.test);
            let scores = x_test
                .iter()
                .map(|row| model.predict_proba(row))
                .collect::<Result<Vec<_>, _>>()?;
            let predicted: Vec<bool> = scores.iter().map(|p| *p >= 0.5).collect();
            let confusion = Confusion::from_labels(&y_test, &predicted);

            let coefficients = EMPLOYEE_FEATURES
                .iter()
                .zip(model.coefficients())
                .map(|(feature, w)| FeatureWeight {
                    feature: feature.to_string(),
                    weight: round_to(*w, 4),
                })
                .collect();
            let metrics = ClassificationMetrics {
                accuracy: round_to(confusion.accuracy(), 4),
                precision: round_to(confusion.precision(), 4),
                recall: round_to(confusion.recall(), 4),
                f1_score: round_to(confusion.f1(), 4),
                auc_roc: round_to(roc_auc(&y_test, &scores), 4),
                coefficients,
                feature_names: EMPLOYEE_FEATURES.iter().map(|s| s.to_string()).collect(),
            };
            Ok(TrainedModel {
                artifact: Artifact::new(name, &EMPLOYEE_FEATURES, model),
                scaler: Some(scaler),
                metrics: MetricsRecord::new(run_id, name, metrics),
            })
        };
        let model = fit().map_err(training_error(name))?;
        info!(
            model = %name,
            auc = model.metrics.values.auc_roc,
            accuracy = model.metrics.values.accuracy,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model trained"
        );
        Ok(model)
    }
}
