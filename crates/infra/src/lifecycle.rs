//! Model lifecycle manager: load-or-train, retrain and shutdown.
//!
//! State transitions:
//! `Uninitialized -> Loading -> Ready`, or
//! `Uninitialized -> Loading -> Training -> Ready` when any artifact is absent
//! or undecodable, and `Ready -> Training -> Ready` on retrain.
//!
//! Initialization and retraining are serialized by one lifecycle lock. The
//! trained [`ModelSet`] is published behind an `Arc` and swapped wholesale, so
//! readers either see a complete set or none at all.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use forgeml_core::{DomainError, DomainResult, ModelName, RunId};
use forgeml_datagen::{DatasetBundle, DatasetSizes, generate_all};

use crate::config::{AnalyticsConfig, TrainingConfig};
use crate::models::ModelSet;
use crate::store::{BlobStore, DatasetStore, FsBlobStore, InMemoryBlobStore, ModelStore, StoreError};
use crate::training::Trainer;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Loading,
    Training,
    Ready,
}

/// How a call to [`ModelLifecycleManager::initialize`] reached readiness.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    AlreadyReady,
    Loaded,
    Trained,
}

/// Row counts written by a dataset generation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetCounts {
    pub projects: usize,
    pub customers: usize,
    pub employees: usize,
    pub inventory: usize,
}

impl From<&DatasetBundle> for DatasetCounts {
    fn from(b: &DatasetBundle) -> Self {
        Self {
            projects: b.projects.len(),
            customers: b.customers.len(),
            employees: b.employees.len(),
            inventory: b.inventory.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelsLoaded {
    pub project_cost: bool,
    pub project_duration: bool,
    pub customer_segments: bool,
    pub employee_turnover: bool,
    /// The forecaster fits per request and is always available.
    pub inventory_forecast: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub state: LifecycleState,
    pub run_id: Option<RunId>,
    pub models_loaded: ModelsLoaded,
}

fn missing_artifact(name: ModelName) -> impl Fn(StoreError) -> DomainError {
    move |e| DomainError::missing_artifact(format!("{name}: {e}"))
}

fn storage_error(e: StoreError) -> DomainError {
    DomainError::storage(e.to_string())
}

/// Owns the trained models of the process.
///
/// Construct one per process and share it by reference (or `Arc`).
pub struct ModelLifecycleManager {
    models: ModelStore,
    datasets: DatasetStore,
    trainer: Trainer,
    seed: u64,
    sizes: DatasetSizes,
    end_date: Option<NaiveDate>,
    lifecycle: Mutex<()>,
    state: RwLock<LifecycleState>,
    current: RwLock<Option<Arc<ModelSet>>>,
}

impl ModelLifecycleManager {
    pub fn new(
        model_blobs: Arc<dyn BlobStore>,
        dataset_blobs: Arc<dyn BlobStore>,
        config: &AnalyticsConfig,
    ) -> Self {
        Self {
            models: ModelStore::new(model_blobs),
            datasets: DatasetStore::new(dataset_blobs),
            trainer: Trainer::new(config.training),
            seed: config.seed,
            sizes: config.sizes,
            end_date: None,
            lifecycle: Mutex::new(()),
            state: RwLock::new(LifecycleState::Uninitialized),
            current: RwLock::new(None),
        }
    }

    /// File-backed stores under the configured directories.
    pub fn from_config(config: &AnalyticsConfig) -> DomainResult<Self> {
        let models = FsBlobStore::open(&config.models_dir).map_err(storage_error)?;
        let datasets = FsBlobStore::open(&config.datasets_dir).map_err(storage_error)?;
        Ok(Self::new(Arc::new(models), Arc::new(datasets), config))
    }

    /// In-memory stores (tests/dev).
    pub fn in_memory(config: &AnalyticsConfig) -> Self {
        Self::new(
            Arc::new(InMemoryBlobStore::new()),
            Arc::new(InMemoryBlobStore::new()),
            config,
        )
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.trainer = Trainer::new(training);
        self
    }

    /// Pin the last day of generated inventory history (defaults to today, UTC).
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read().unwrap()
    }

    pub fn is_ready(&self) -> bool {
        self.current.read().unwrap().is_some()
    }

    pub fn datasets(&self) -> &DatasetStore {
        &self.datasets
    }

    /// Load every persisted model, or train and persist a fresh set.
    ///
    /// Concurrent callers serialize on the lifecycle lock; whoever arrives
    /// after readiness returns `AlreadyReady` without touching storage.
    pub fn initialize(&self) -> DomainResult<InitOutcome> {
        if self.is_ready() {
            return Ok(InitOutcome::AlreadyReady);
        }
        let _guard = self.lifecycle.lock().unwrap();
        if self.is_ready() {
            return Ok(InitOutcome::AlreadyReady);
        }

        self.set_state(LifecycleState::Loading);
        let started = Instant::now();
        match self.load_all() {
            Ok(set) => {
                info!(
                    run_id = %set.project_cost.run_id(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "models loaded"
                );
                self.publish(set);
                Ok(InitOutcome::Loaded)
            }
            Err(e) => {
                warn!(error = %e, "persisted models unusable; training from scratch");
                self.train_and_publish()?;
                Ok(InitOutcome::Trained)
            }
        }
    }

    /// The current model set, initializing first if needed.
    pub fn models(&self) -> DomainResult<Arc<ModelSet>> {
        if let Some(set) = self.current.read().unwrap().as_ref() {
            return Ok(Arc::clone(set));
        }
        self.initialize()?;
        self.try_models()
    }

    /// The current model set, or `Uninitialized` without blocking.
    pub fn try_models(&self) -> DomainResult<Arc<ModelSet>> {
        self.current
            .read()
            .unwrap()
            .as_ref()
            .map(Arc::clone)
            .ok_or(DomainError::Uninitialized)
    }

    /// Discard in-memory models, regenerate datasets and train a new set.
    ///
    /// Readers arriving during the retrain block in [`Self::models`] until the
    /// new set is published.
    pub fn retrain(&self) -> DomainResult<Arc<ModelSet>> {
        let _guard = self.lifecycle.lock().unwrap();
        info!("retrain requested");
        *self.current.write().unwrap() = None;
        self.train_and_publish()
    }

    /// Regenerate and persist every dataset without retraining.
    pub fn regenerate_datasets(&self) -> DomainResult<DatasetCounts> {
        let _guard = self.lifecycle.lock().unwrap();
        let bundle = self.generate()?;
        self.datasets.save_all(&bundle).map_err(storage_error)?;
        let counts = DatasetCounts::from(&bundle);
        info!(?counts, "datasets regenerated");
        Ok(counts)
    }

    /// Drop in-memory models; the next access loads them again.
    pub fn shutdown(&self) {
        let _guard = self.lifecycle.lock().unwrap();
        *self.current.write().unwrap() = None;
        self.set_state(LifecycleState::Uninitialized);
        info!("model lifecycle shut down");
    }

    pub fn health(&self) -> HealthReport {
        let current = self.current.read().unwrap().clone();
        let loaded = current.is_some();
        HealthReport {
            state: self.state(),
            run_id: current.map(|s| s.project_cost.run_id()),
            models_loaded: ModelsLoaded {
                project_cost: loaded,
                project_duration: loaded,
                customer_segments: loaded,
                employee_turnover: loaded,
                inventory_forecast: true,
            },
        }
    }

    fn set_state(&self, state: LifecycleState) {
        *self.state.write().unwrap() = state;
    }

    fn publish(&self, set: ModelSet) -> Arc<ModelSet> {
        let set = Arc::new(set);
        *self.current.write().unwrap() = Some(Arc::clone(&set));
        self.set_state(LifecycleState::Ready);
        set
    }

    /// All four models, from a single training run, or `MissingArtifact`.
    fn load_all(&self) -> DomainResult<ModelSet> {
        let set = ModelSet {
            project_cost: self
                .models
                .load(ModelName::ProjectCost)
                .map_err(missing_artifact(ModelName::ProjectCost))?,
            project_duration: self
                .models
                .load(ModelName::ProjectDuration)
                .map_err(missing_artifact(ModelName::ProjectDuration))?,
            customer_segments: self
                .models
                .load(ModelName::CustomerSegments)
                .map_err(missing_artifact(ModelName::CustomerSegments))?,
            employee_turnover: self
                .models
                .load(ModelName::EmployeeTurnover)
                .map_err(missing_artifact(ModelName::EmployeeTurnover))?,
        };

        let run = set.project_cost.run_id();
        let mixed = set.project_duration.run_id() != run
            || set.customer_segments.run_id() != run
            || set.employee_turnover.run_id() != run;
        if mixed {
            return Err(DomainError::missing_artifact(
                "persisted models come from different training runs",
            ));
        }
        Ok(set)
    }

    fn generate(&self) -> DomainResult<DatasetBundle> {
        let end_date = self.end_date.unwrap_or_else(|| Utc::now().date_naive());
        generate_all(self.seed, self.sizes, end_date)
            .map_err(|e| DomainError::generation(e.to_string()))
    }

    fn persist(&self, set: &ModelSet) -> Result<(), StoreError> {
        self.models.save(&set.project_cost)?;
        self.models.save(&set.project_duration)?;
        self.models.save(&set.customer_segments)?;
        self.models.save(&set.employee_turnover)
    }

    /// Caller holds the lifecycle lock.
    fn train_and_publish(&self) -> DomainResult<Arc<ModelSet>> {
        self.set_state(LifecycleState::Training);
        let started = Instant::now();

        let result = self.generate().and_then(|bundle| {
            self.datasets.save_all(&bundle).map_err(storage_error)?;
            let set = self.trainer.train_all(&bundle)?;
            self.persist(&set).map_err(storage_error)?;
            Ok(set)
        });

        match result {
            Ok(set) => {
                info!(
                    run_id = %set.project_cost.run_id(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "models trained and persisted"
                );
                Ok(self.publish(set))
            }
            Err(e) => {
                error!(error = %e, "training failed");
                self.set_state(LifecycleState::Uninitialized);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ModelLifecycleManager {
        let mut config = AnalyticsConfig::default();
        config.sizes = DatasetSizes {
            projects: 80,
            customers: 80,
            employees: 100,
            inventory_days: 30,
        };
        ModelLifecycleManager::in_memory(&config)
            .with_training(TrainingConfig::quick(42))
            .with_end_date(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap())
    }

    #[test]
    fn starts_uninitialized_and_try_models_does_not_block() {
        let m = manager();
        assert_eq!(m.state(), LifecycleState::Uninitialized);
        assert_eq!(m.try_models().unwrap_err(), DomainError::Uninitialized);
        assert!(!m.health().models_loaded.project_cost);
        assert!(m.health().models_loaded.inventory_forecast);
    }

    #[test]
    fn first_initialize_trains_and_second_is_a_no_op() {
        let m = manager();
        assert_eq!(m.initialize().unwrap(), InitOutcome::Trained);
        let first = m.try_models().unwrap();

        assert_eq!(m.initialize().unwrap(), InitOutcome::AlreadyReady);
        let second = m.try_models().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(m.state(), LifecycleState::Ready);
    }

    #[test]
    fn models_initializes_on_first_access() {
        let m = manager();
        let set = m.models().unwrap();
        assert_eq!(m.health().run_id, Some(set.project_cost.run_id()));
    }

    #[test]
    fn shutdown_then_initialize_loads_persisted_models() {
        let m = manager();
        m.initialize().unwrap();
        let before = m.try_models().unwrap();

        m.shutdown();
        assert!(!m.is_ready());
        assert_eq!(m.initialize().unwrap(), InitOutcome::Loaded);
        let after = m.try_models().unwrap();
        assert_eq!(*before, *after);
    }

    #[test]
    fn regenerate_writes_datasets_without_touching_models() {
        let m = manager();
        let counts = m.regenerate_datasets().unwrap();
        assert_eq!(counts.customers, 80);
        assert_eq!(counts.inventory, 5 * 30);
        assert_eq!(m.datasets().employees().unwrap().len(), 100);
        assert!(!m.is_ready());
    }
}
