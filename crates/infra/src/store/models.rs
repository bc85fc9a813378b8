use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use forgeml_ai::StandardScaler;
use forgeml_core::ModelName;

use super::r#trait::{BlobStore, StoreError};
use super::{read_json, write_json};
use crate::models::{Artifact, MetricsRecord, TrainedModel};

pub fn artifact_key(name: ModelName) -> String {
    format!("{name}.model.json")
}

pub fn scaler_key(name: ModelName) -> String {
    format!("{name}.scaler.json")
}

pub fn metrics_key(name: ModelName) -> String {
    format!("{name}.metrics.json")
}

/// Persists each model as three independently named blobs.
#[derive(Clone)]
pub struct ModelStore {
    blobs: Arc<dyn BlobStore>,
}

impl ModelStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub fn save<M, X>(&self, model: &TrainedModel<M, X>) -> Result<(), StoreError>
    where
        M: Serialize,
        X: Serialize,
    {
        let name = model.name();
        match &model.scaler {
            Some(scaler) => write_json(self.blobs.as_ref(), &scaler_key(name), scaler)?,
            None => self.blobs.delete(&scaler_key(name))?,
        }
        write_json(self.blobs.as_ref(), &metrics_key(name), &model.metrics)?;
        write_json(self.blobs.as_ref(), &artifact_key(name), &model.artifact)?;
        debug!(model = %name, "model persisted");
        Ok(())
    }

    /// Load and cross-check the three blobs of `name`.
    ///
    /// A scaler is required exactly when the artifact was trained on scaled
    /// features, and must match the artifact's feature width.
    pub fn load<M, X>(&self, name: ModelName) -> Result<TrainedModel<M, X>, StoreError>
    where
        M: DeserializeOwned,
        X: DeserializeOwned,
    {
        let key = artifact_key(name);
        let artifact: Artifact<M> = read_json(self.blobs.as_ref(), &key)?;
        if artifact.model_name != name {
            return Err(StoreError::corrupt(
                &key,
                format!("artifact belongs to {}", artifact.model_name),
            ));
        }
        if artifact.scaled != name.uses_scaler() {
            return Err(StoreError::corrupt(&key, "unexpected scaling flag"));
        }

        let scaler = if artifact.scaled {
            let key = scaler_key(name);
            let scaler: StandardScaler = read_json(self.blobs.as_ref(), &key)?;
            if scaler.n_features() != artifact.feature_names.len() {
                return Err(StoreError::corrupt(
                    &key,
                    format!(
                        "scaler has {} features, artifact has {}",
                        scaler.n_features(),
                        artifact.feature_names.len()
                    ),
                ));
            }
            Some(scaler)
        } else {
            None
        };

        let key = metrics_key(name);
        let metrics: MetricsRecord<X> = read_json(self.blobs.as_ref(), &key)?;
        if metrics.model != name {
            return Err(StoreError::corrupt(&key, format!("metrics belong to {}", metrics.model)));
        }

        Ok(TrainedModel {
            artifact,
            scaler,
            metrics,
        })
    }

    /// Whether every blob `name` needs is present.
    pub fn contains(&self, name: ModelName) -> Result<bool, StoreError> {
        let scaler_ok = !name.uses_scaler() || self.blobs.exists(&scaler_key(name))?;
        Ok(scaler_ok
            && self.blobs.exists(&artifact_key(name))?
            && self.blobs.exists(&metrics_key(name))?)
    }

    pub fn remove(&self, name: ModelName) -> Result<(), StoreError> {
        self.blobs.delete(&artifact_key(name))?;
        self.blobs.delete(&scaler_key(name))?;
        self.blobs.delete(&metrics_key(name))
    }
}
