//! `forgeml-datagen`: synthetic training datasets.
//!
//! Four independent generators, each seeded on its own so a dataset can be
//! regenerated without disturbing the others:
//! - [`ProjectGenerator`]: cost and duration regression rows
//! - [`CustomerGenerator`]: segment-structured customers for clustering
//! - [`EmployeeGenerator`]: turnover classification rows
//! - [`InventoryGenerator`]: daily demand and stock history per material
//!
//! Row-level formulas (targets, correlations, demand components, stock walk)
//! are plain functions over one row so they can be tested without sampling.

use chrono::NaiveDate;
use tracing::debug;

pub mod customer;
pub mod employee;
pub mod inventory;
pub mod project;
pub mod sampling;

pub use customer::{CustomerGenerator, CustomerRecord, CustomerSegment, segment_sizes};
pub use employee::{EmployeeFeatures, EmployeeGenerator, EmployeeRecord};
pub use inventory::{
    InventoryGenerator, InventoryRecord, MATERIALS, Material, material, seasonality_pattern,
    simulate_stock_levels,
};
pub use project::{ProjectFeatures, ProjectGenerator, ProjectRecord};
pub use sampling::DatagenError;

/// Row counts for one generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSizes {
    pub projects: usize,
    pub customers: usize,
    pub employees: usize,
    pub inventory_days: usize,
}

impl Default for DatasetSizes {
    fn default() -> Self {
        Self {
            projects: 500,
            customers: 300,
            employees: 400,
            inventory_days: 730,
        }
    }
}

/// The four datasets of one training cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBundle {
    pub projects: Vec<ProjectRecord>,
    pub customers: Vec<CustomerRecord>,
    pub employees: Vec<EmployeeRecord>,
    pub inventory: Vec<InventoryRecord>,
}

/// Generate every dataset with the same seed; inventory history ends on `end_date`.
pub fn generate_all(
    seed: u64,
    sizes: DatasetSizes,
    end_date: NaiveDate,
) -> Result<DatasetBundle, DatagenError> {
    let projects = ProjectGenerator::new(seed).generate(sizes.projects)?;
    debug!(rows = projects.len(), "generated projects");
    let customers = CustomerGenerator::new(seed).generate(sizes.customers)?;
    debug!(rows = customers.len(), "generated customers");
    let employees = EmployeeGenerator::new(seed).generate(sizes.employees)?;
    debug!(rows = employees.len(), "generated employees");
    let inventory = InventoryGenerator::new(seed).generate(sizes.inventory_days, end_date)?;
    debug!(rows = inventory.len(), "generated inventory history");

    Ok(DatasetBundle {
        projects,
        customers,
        employees,
        inventory,
    })
}
