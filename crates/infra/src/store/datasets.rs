use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use forgeml_datagen::{
    CustomerRecord, DatasetBundle, EmployeeRecord, InventoryRecord, ProjectRecord,
};

use super::r#trait::{BlobStore, StoreError};
use super::{read_json, write_json};

pub const PROJECTS_KEY: &str = "projects.json";
pub const CUSTOMERS_KEY: &str = "customers.json";
pub const EMPLOYEES_KEY: &str = "employees.json";
pub const INVENTORY_KEY: &str = "inventory_history.json";

/// Persists each generated dataset as a JSON array of rows.
#[derive(Clone)]
pub struct DatasetStore {
    blobs: Arc<dyn BlobStore>,
}

impl DatasetStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub fn save_all(&self, bundle: &DatasetBundle) -> Result<(), StoreError> {
        self.save_rows(PROJECTS_KEY, &bundle.projects)?;
        self.save_rows(CUSTOMERS_KEY, &bundle.customers)?;
        self.save_rows(EMPLOYEES_KEY, &bundle.employees)?;
        self.save_rows(INVENTORY_KEY, &bundle.inventory)
    }

    pub fn projects(&self) -> Result<Vec<ProjectRecord>, StoreError> {
        self.load_rows(PROJECTS_KEY)
    }

    pub fn customers(&self) -> Result<Vec<CustomerRecord>, StoreError> {
        self.load_rows(CUSTOMERS_KEY)
    }

    pub fn employees(&self) -> Result<Vec<EmployeeRecord>, StoreError> {
        self.load_rows(EMPLOYEES_KEY)
    }

    pub fn inventory(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        self.load_rows(INVENTORY_KEY)
    }

    fn save_rows<T: Serialize>(&self, key: &str, rows: &[T]) -> Result<(), StoreError> {
        write_json(self.blobs.as_ref(), key, &rows)?;
        debug!(dataset = key, rows = rows.len(), "dataset persisted");
        Ok(())
    }

    fn load_rows<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        read_json(self.blobs.as_ref(), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryBlobStore;
    use chrono::NaiveDate;
    use forgeml_datagen::{DatasetSizes, generate_all};

    #[test]
    fn bundle_round_trips() {
        let sizes = DatasetSizes {
            projects: 15,
            customers: 12,
            employees: 10,
            inventory_days: 5,
        };
        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let bundle = generate_all(3, sizes, end).unwrap();

        let store = DatasetStore::new(Arc::new(InMemoryBlobStore::new()));
        store.save_all(&bundle).unwrap();

        assert_eq!(store.projects().unwrap(), bundle.projects);
        assert_eq!(store.customers().unwrap(), bundle.customers);
        assert_eq!(store.employees().unwrap(), bundle.employees);
        assert_eq!(store.inventory().unwrap(), bundle.inventory);
    }

    #[test]
    fn absent_dataset_is_not_found() {
        let store = DatasetStore::new(Arc::new(InMemoryBlobStore::new()));
        assert!(matches!(store.employees(), Err(StoreError::NotFound(_))));
    }
}
