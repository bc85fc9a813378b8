//! Integration tests for the full analytics pipeline.
//!
//! Tests: Generate → Train → Persist → Load → Predict / Forecast
//!
//! Verifies:
//! - Retraining with the same seed reproduces metrics under a new run id
//! - Any unusable artifact forces a full retrain
//! - Models reloaded from disk answer exactly like the ones that were saved
//! - Concurrent first-time initialization trains exactly once
//! - Readers never observe a partially published model set

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::NaiveDate;

    use forgeml_core::{EMPLOYEE_FEATURES, FeatureMap, MaterialId, ModelName, PROJECT_FEATURES};
    use forgeml_datagen::DatasetSizes;

    use crate::config::{AnalyticsConfig, TrainingConfig};
    use crate::forecasting::{ForecastEngine, ForecastRequest, inventory_overview};
    use crate::lifecycle::{InitOutcome, LifecycleState, ModelLifecycleManager};
    use crate::prediction::{
        analyze_customer_segments, predict_employee_turnover, predict_project_cost,
        predict_project_duration, turnover_overview,
    };
    use crate::store::models::artifact_key;
    use crate::store::{BlobStore, FsBlobStore, InMemoryBlobStore};

    fn small_config() -> AnalyticsConfig {
        let mut config = AnalyticsConfig::default();
        config.sizes = DatasetSizes {
            projects: 80,
            customers: 80,
            employees: 100,
            inventory_days: 120,
        };
        config
    }

    fn end_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn setup(models: Arc<dyn BlobStore>, datasets: Arc<dyn BlobStore>) -> ModelLifecycleManager {
        ModelLifecycleManager::new(models, datasets, &small_config())
            .with_training(TrainingConfig::quick(42))
            .with_end_date(end_date())
    }

    fn sample_project() -> FeatureMap {
        let values = [2.0, 850.0, 3.0, 2.0, 6.5, 2.0, 1.0, 0.0, 2.0, 12.0, 8.0];
        PROJECT_FEATURES.iter().copied().zip(values).collect()
    }

    fn sample_employee() -> FeatureMap {
        let values = [18.0, 27.0, 1.0, 2.0, 5.5, 45.0, 40.0, 0.0, 10.0, 3.0, 6.0];
        EMPLOYEE_FEATURES.iter().copied().zip(values).collect()
    }

    #[test]
    fn retrain_reproduces_metrics_under_a_new_run_id() {
        let m = setup(Arc::new(InMemoryBlobStore::new()), Arc::new(InMemoryBlobStore::new()));
        m.initialize().unwrap();
        let first = m.try_models().unwrap();

        let second = m.retrain().unwrap();
        assert_ne!(first.project_cost.run_id(), second.project_cost.run_id());
        assert_eq!(
            first.project_cost.metrics.values,
            second.project_cost.metrics.values
        );
        assert_eq!(
            first.employee_turnover.metrics.values,
            second.employee_turnover.metrics.values
        );
        assert_eq!(first.customer_segments.artifact, second.customer_segments.artifact);
        assert_eq!(m.state(), LifecycleState::Ready);
    }

    #[test]
    fn corrupt_artifact_forces_a_full_retrain() {
        let models = Arc::new(InMemoryBlobStore::new());
        let m = setup(models.clone(), Arc::new(InMemoryBlobStore::new()));
        m.initialize().unwrap();
        let original = m.try_models().unwrap().project_cost.run_id();
        m.shutdown();

        models
            .put(&artifact_key(ModelName::EmployeeTurnover), b"{ not json")
            .unwrap();

        assert_eq!(m.initialize().unwrap(), InitOutcome::Trained);
        let set = m.try_models().unwrap();
        assert_ne!(set.project_cost.run_id(), original);
        assert_eq!(set.employee_turnover.run_id(), set.project_cost.run_id());
    }

    #[test]
    fn missing_artifact_forces_a_full_retrain() {
        let models = Arc::new(InMemoryBlobStore::new());
        let m = setup(models.clone(), Arc::new(InMemoryBlobStore::new()));
        m.initialize().unwrap();
        m.shutdown();

        models.delete(&artifact_key(ModelName::CustomerSegments)).unwrap();
        assert_eq!(m.initialize().unwrap(), InitOutcome::Trained);
        assert!(models.exists(&artifact_key(ModelName::CustomerSegments)).unwrap());
    }

    #[test]
    fn reloaded_models_predict_identically() {
        let dir = tempfile::tempdir().unwrap();
        let open = |sub: &str| -> Arc<dyn BlobStore> {
            Arc::new(FsBlobStore::open(dir.path().join(sub)).unwrap())
        };

        let trained = setup(open("models"), open("datasets"));
        assert_eq!(trained.initialize().unwrap(), InitOutcome::Trained);
        let before = trained.try_models().unwrap();

        let reloaded = setup(open("models"), open("datasets"));
        assert_eq!(reloaded.initialize().unwrap(), InitOutcome::Loaded);
        let after = reloaded.try_models().unwrap();

        assert_eq!(
            predict_project_cost(&before.project_cost, sample_project()).unwrap(),
            predict_project_cost(&after.project_cost, sample_project()).unwrap()
        );
        assert_eq!(
            predict_project_duration(&before.project_duration, sample_project()).unwrap(),
            predict_project_duration(&after.project_duration, sample_project()).unwrap()
        );
        assert_eq!(
            predict_employee_turnover(&before.employee_turnover, sample_employee()).unwrap(),
            predict_employee_turnover(&after.employee_turnover, sample_employee()).unwrap()
        );

        let customers = reloaded.datasets().customers().unwrap();
        assert_eq!(
            analyze_customer_segments(&before.customer_segments, &customers).unwrap(),
            analyze_customer_segments(&after.customer_segments, &customers).unwrap()
        );
    }

    #[test]
    fn stored_datasets_feed_overviews_and_forecasts() {
        let m = setup(Arc::new(InMemoryBlobStore::new()), Arc::new(InMemoryBlobStore::new()));
        let set = m.models().unwrap();

        let employees = m.datasets().employees().unwrap();
        let overview = turnover_overview(&set.employee_turnover, &employees).unwrap();
        assert_eq!(overview.total_employees, 100);
        assert_eq!(
            overview.low_risk + overview.medium_risk + overview.high_risk,
            overview.total_employees
        );

        let history = m.datasets().inventory().unwrap();
        let inventory = inventory_overview(&history);
        assert_eq!(inventory.materials_analyzed, 5);

        let request = ForecastRequest::from_features(
            FeatureMap::new()
                .with("material_id", 2.0)
                .with("forecast_days", 21.0)
                .with("current_stock", 40.0)
                .with("reorder_point", 50.0)
                .with("lead_time_days", 7.0),
        )
        .unwrap();
        let forecast = ForecastEngine::new().forecast(&history, &request).unwrap();
        assert_eq!(forecast.material.id, MaterialId(2));
        assert_eq!(forecast.daily_forecast.len(), 21);
        assert_eq!(
            forecast.daily_forecast[0].date,
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
    }

    #[test]
    fn concurrent_first_initialization_trains_once() {
        let m = Arc::new(setup(
            Arc::new(InMemoryBlobStore::new()),
            Arc::new(InMemoryBlobStore::new()),
        ));

        let callers: Vec<_> = (0..6)
            .map(|_| {
                let m = Arc::clone(&m);
                thread::spawn(move || m.initialize().unwrap())
            })
            .collect();
        let outcomes: Vec<InitOutcome> = callers.into_iter().map(|c| c.join().unwrap()).collect();

        let trained = outcomes.iter().filter(|o| **o == InitOutcome::Trained).count();
        assert_eq!(trained, 1, "{outcomes:?}");
        assert!(
            outcomes
                .iter()
                .all(|o| matches!(o, InitOutcome::Trained | InitOutcome::AlreadyReady))
        );
        assert_eq!(m.state(), LifecycleState::Ready);
    }

    #[test]
    fn readers_during_retrain_see_a_complete_set() {
        let m = Arc::new(setup(
            Arc::new(InMemoryBlobStore::new()),
            Arc::new(InMemoryBlobStore::new()),
        ));
        m.initialize().unwrap();

        let writer = {
            let m = Arc::clone(&m);
            thread::spawn(move || m.retrain().map(|set| set.project_cost.run_id()))
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&m);
                thread::spawn(move || {
                    let set = m.models().unwrap();
                    let run = set.project_cost.run_id();
                    assert_eq!(set.project_duration.run_id(), run);
                    assert_eq!(set.customer_segments.run_id(), run);
                    assert_eq!(set.employee_turnover.run_id(), run);
                })
            })
            .collect();

        let new_run = writer.join().unwrap().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(m.try_models().unwrap().project_cost.run_id(), new_run);
    }
}
