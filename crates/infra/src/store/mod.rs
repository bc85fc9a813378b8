//! Durable storage for datasets and model artifacts.
//!
//! Everything is written through the [`BlobStore`] boundary as JSON documents,
//! so the lifecycle manager can run against a directory in production and an
//! in-memory map in tests.

pub mod datasets;
pub mod fs;
pub mod in_memory;
pub mod models;
pub mod r#trait;

pub use datasets::DatasetStore;
pub use fs::FsBlobStore;
pub use in_memory::InMemoryBlobStore;
pub use models::ModelStore;
pub use r#trait::{BlobStore, StoreError};

use serde::Serialize;
use serde::de::DeserializeOwned;

pub(crate) fn write_json<T: Serialize + ?Sized>(
    store: &dyn BlobStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value).map_err(|e| StoreError::serialization(key, e))?;
    store.put(key, &bytes)
}

pub(crate) fn read_json<T: DeserializeOwned>(
    store: &dyn BlobStore,
    key: &str,
) -> Result<T, StoreError> {
    let bytes = store.get(key)?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::serialization(key, e))
}
