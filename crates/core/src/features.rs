//! Feature names, request schemas and caller-supplied feature maps.
//!
//! The `*_FEATURES` arrays are the training order of each model. Inference must
//! build vectors in the order recorded with the trained artifact, which is
//! copied from these arrays at training time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{DomainError, DomainResult};

/// Project features, in training order (cost and duration regressors).
pub const PROJECT_FEATURES: [&str; 11] = [
    "project_type_id",
    "area_m2",
    "num_floors",
    "location_zone",
    "complexity_score",
    "material_quality",
    "has_basement",
    "has_pool",
    "season_start",
    "team_size",
    "manager_experience_years",
];

/// Employee features, in training order (turnover classifier).
pub const EMPLOYEE_FEATURES: [&str; 11] = [
    "tenure_months",
    "age",
    "salary_level",
    "department",
    "performance_score",
    "overtime_hours_monthly",
    "distance_from_home_km",
    "num_promotions",
    "training_hours_yearly",
    "satisfaction_score",
    "num_projects_assigned",
];

/// Customer features fed to the clustering model, in training order.
pub const CUSTOMER_CLUSTER_FEATURES: [&str; 6] = [
    "total_revenue",
    "num_projects",
    "months_as_customer",
    "payment_delay_avg_days",
    "communication_score",
    "project_frequency",
];

/// Fields of an inventory forecast request.
pub const FORECAST_REQUEST_FIELDS: [&str; 5] = [
    "material_id",
    "forecast_days",
    "current_stock",
    "reorder_point",
    "lead_time_days",
];

/// Required keys (and defaults for optional ones) of one inbound operation.
#[derive(Debug, Clone, Copy)]
pub struct FeatureSchema {
    pub operation: &'static str,
    pub required: &'static [&'static str],
    pub defaults: &'static [(&'static str, f64)],
}

pub const PROJECT_COST_SCHEMA: FeatureSchema = FeatureSchema {
    operation: "project_cost",
    required: &PROJECT_FEATURES,
    defaults: &[],
};

pub const PROJECT_DURATION_SCHEMA: FeatureSchema = FeatureSchema {
    operation: "project_duration",
    required: &[
        "project_type_id",
        "area_m2",
        "num_floors",
        "complexity_score",
        "team_size",
        "manager_experience_years",
        "season_start",
    ],
    defaults: &[
        ("location_zone", 2.0),
        ("material_quality", 2.0),
        ("has_basement", 0.0),
        ("has_pool", 0.0),
    ],
};

pub const EMPLOYEE_TURNOVER_SCHEMA: FeatureSchema = FeatureSchema {
    operation: "employee_turnover",
    required: &EMPLOYEE_FEATURES,
    defaults: &[],
};

pub const INVENTORY_FORECAST_SCHEMA: FeatureSchema = FeatureSchema {
    operation: "inventory_forecast",
    required: &FORECAST_REQUEST_FIELDS,
    defaults: &[],
};

impl FeatureSchema {
    /// Check required keys and fill defaults.
    ///
    /// Fails with `MissingRequiredFeature` naming the first absent key, in
    /// schema order.
    pub fn resolve(&self, mut features: FeatureMap) -> DomainResult<FeatureMap> {
        features.require(self.required)?;
        for (name, value) in self.defaults {
            features.0.entry((*name).to_string()).or_insert(*value);
        }
        Ok(features)
    }
}

/// Caller-supplied numeric features keyed by name.
///
/// Booleans are encoded as `1.0`/`0.0`; categorical ids as their numeric code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap(BTreeMap<String, f64>);

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Parse a JSON object of numbers, booleans or numeric strings.
    ///
    /// `null` entries are treated as absent.
    pub fn from_json(value: &JsonValue) -> DomainResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| DomainError::validation("request body must be a JSON object"))?;

        let mut map = FeatureMap::new();
        for (key, v) in obj {
            let num = match v {
                JsonValue::Null => continue,
                JsonValue::Bool(b) => {
                    if *b {
                        1.0
                    } else {
                        0.0
                    }
                }
                JsonValue::Number(n) => n.as_f64().ok_or_else(|| {
                    DomainError::validation(format!("field {key} is not representable as f64"))
                })?,
                JsonValue::String(s) => match s.trim() {
                    "true" => 1.0,
                    "false" => 0.0,
                    other => other.parse::<f64>().map_err(|_| {
                        DomainError::validation(format!("field {key} must be numeric, got {s:?}"))
                    })?,
                },
                _ => {
                    return Err(DomainError::validation(format!(
                        "field {key} must be a number or boolean"
                    )));
                }
            };
            if !num.is_finite() {
                return Err(DomainError::validation(format!("field {key} must be finite")));
            }
            map.insert(key.clone(), num);
        }
        Ok(map)
    }

    /// Fail with `MissingRequiredFeature` for the first name not present.
    pub fn require(&self, names: &[&str]) -> DomainResult<()> {
        match names.iter().find(|n| !self.contains(n)) {
            Some(missing) => Err(DomainError::missing_feature(*missing)),
            None => Ok(()),
        }
    }

    /// Build a feature vector in exactly the order given.
    pub fn vector_for<S: AsRef<str>>(&self, names: &[S]) -> DomainResult<Vec<f64>> {
        names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                self.get(n).ok_or_else(|| DomainError::missing_feature(n))
            })
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_accepts_numbers_booleans_and_numeric_strings() {
        let map = FeatureMap::from_json(&json!({
            "area_m2": 1200.5,
            "has_pool": true,
            "has_basement": "false",
            "team_size": "14",
            "ignored": null,
        }))
        .unwrap();

        assert_eq!(map.get("area_m2"), Some(1200.5));
        assert_eq!(map.get("has_pool"), Some(1.0));
        assert_eq!(map.get("has_basement"), Some(0.0));
        assert_eq!(map.get("team_size"), Some(14.0));
        assert!(!map.contains("ignored"));
    }

    #[test]
    fn from_json_rejects_non_objects_and_text() {
        assert!(matches!(
            FeatureMap::from_json(&json!([1, 2])),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            FeatureMap::from_json(&json!({ "age": "forty" })),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn resolve_reports_first_missing_key_in_schema_order() {
        let features = FeatureMap::new().with("project_type_id", 1.0);
        let err = PROJECT_COST_SCHEMA.resolve(features).unwrap_err();
        assert_eq!(err, DomainError::MissingRequiredFeature("area_m2".to_string()));
    }

    #[test]
    fn duration_schema_fills_optional_defaults() {
        let features: FeatureMap = PROJECT_DURATION_SCHEMA
            .required
            .iter()
            .map(|k| (*k, 1.0))
            .collect();
        let resolved = PROJECT_DURATION_SCHEMA.resolve(features).unwrap();

        assert_eq!(resolved.get("location_zone"), Some(2.0));
        assert_eq!(resolved.get("has_pool"), Some(0.0));
        assert!(resolved.vector_for(&PROJECT_FEATURES).is_ok());
    }

    #[test]
    fn defaults_never_override_caller_values() {
        let mut features: FeatureMap = PROJECT_DURATION_SCHEMA
            .required
            .iter()
            .map(|k| (*k, 1.0))
            .collect();
        features.insert("material_quality", 3.0);
        let resolved = PROJECT_DURATION_SCHEMA.resolve(features).unwrap();
        assert_eq!(resolved.get("material_quality"), Some(3.0));
    }

    #[test]
    fn vector_for_follows_requested_order() {
        let map = FeatureMap::new().with("b", 2.0).with("a", 1.0).with("c", 3.0);
        assert_eq!(map.vector_for(&["c", "a", "b"]).unwrap(), vec![3.0, 1.0, 2.0]);
        assert_eq!(
            map.vector_for(&["a", "z"]).unwrap_err(),
            DomainError::MissingRequiredFeature("z".to_string())
        );
    }
}
