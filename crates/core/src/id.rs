//! Strongly-typed identifiers used across the analytics layers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of one training run (attached to every metrics record it produced).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new run identifier.
    ///
    /// Uses UUIDv7 (time-ordered) so later runs sort after earlier ones.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RunId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::validation(format!("RunId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Catalog identifier of an inventory material.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub u32);

impl MaterialId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Logical name of a persisted model.
///
/// The order of [`ModelName::ALL`] is the fixed training order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelName {
    ProjectCost,
    ProjectDuration,
    CustomerSegments,
    EmployeeTurnover,
}

impl ModelName {
    pub const ALL: [ModelName; 4] = [
        ModelName::ProjectCost,
        ModelName::ProjectDuration,
        ModelName::CustomerSegments,
        ModelName::EmployeeTurnover,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelName::ProjectCost => "project_cost",
            ModelName::ProjectDuration => "project_duration",
            ModelName::CustomerSegments => "customer_segments",
            ModelName::EmployeeTurnover => "employee_turnover",
        }
    }

    /// Estimator family used for this model (reported in model metadata).
    pub fn estimator(self) -> &'static str {
        match self {
            ModelName::ProjectCost => "RandomForestRegressor",
            ModelName::ProjectDuration => "GradientBoostingRegressor",
            ModelName::CustomerSegments => "KMeans",
            ModelName::EmployeeTurnover => "LogisticRegression",
        }
    }

    /// Whether the estimator is trained on standardized features.
    pub fn uses_scaler(self) -> bool {
        matches!(self, ModelName::CustomerSegments | ModelName::EmployeeTurnover)
    }
}

impl core::fmt::Display for ModelName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelName::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DomainError::unknown_entity("model", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_round_trip_through_str() {
        for name in ModelName::ALL {
            assert_eq!(name.as_str().parse::<ModelName>().unwrap(), name);
        }
        assert!(matches!(
            "random_model".parse::<ModelName>(),
            Err(DomainError::UnknownEntity { kind: "model", .. })
        ));
    }

    #[test]
    fn only_segmentation_and_turnover_are_scaled() {
        let scaled: Vec<_> = ModelName::ALL.into_iter().filter(|m| m.uses_scaler()).collect();
        assert_eq!(
            scaled,
            vec![ModelName::CustomerSegments, ModelName::EmployeeTurnover]
        );
    }

    #[test]
    fn run_ids_are_unique_and_parse_back() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().parse::<RunId>().unwrap(), a);
    }
}
