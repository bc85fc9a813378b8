//! Configuration loading and representation.
//!
//! Values come from `FORGEML_*` environment variables with defaults that match
//! a local development setup. Parsing is separated from the environment so it
//! can be exercised with a plain map.

use std::path::PathBuf;

use forgeml_ai::{BoostingParams, ForestParams, KMeansParams, LogisticParams, TreeParams};
use forgeml_datagen::DatasetSizes;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Hyperparameters of the four trained models and the hold-out split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub seed: u64,
    pub test_fraction: f64,
    pub forest: ForestParams,
    pub boosting: BoostingParams,
    pub kmeans: KMeansParams,
    pub logistic: LogisticParams,
}

impl TrainingConfig {
    pub fn with_seed(seed: u64) -> Self {
        let mut cfg = Self::default();
        cfg.seed = seed;
        cfg.forest.seed = seed;
        cfg.kmeans.seed = seed;
        cfg
    }

    /// Reduced ensembles and restarts for tests and smoke runs.
    pub fn quick(seed: u64) -> Self {
        let mut cfg = Self::with_seed(seed);
        cfg.forest.n_estimators = 10;
        cfg.forest.tree.max_depth = 8;
        cfg.boosting.n_estimators = 20;
        cfg.boosting.tree.max_depth = 4;
        cfg.kmeans.n_init = 2;
        cfg
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            forest: ForestParams {
                n_estimators: 100,
                tree: TreeParams {
                    max_depth: 15,
                    min_samples_split: 5,
                    min_samples_leaf: 2,
                },
                seed: 42,
            },
            boosting: BoostingParams::default(),
            kmeans: KMeansParams::default(),
            logistic: LogisticParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    pub models_dir: PathBuf,
    pub datasets_dir: PathBuf,
    pub seed: u64,
    pub sizes: DatasetSizes,
    pub log_format: LogFormat,
    pub training: TrainingConfig,
    /// Trailing days averaged by the forecast fallback.
    pub fallback_window: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("./trained_models"),
            datasets_dir: PathBuf::from("./datasets"),
            seed: 42,
            sizes: DatasetSizes::default(),
            log_format: LogFormat::Json,
            training: TrainingConfig::default(),
            fallback_window: 30,
        }
    }
}

fn parse_num<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_count(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    let n: usize = parse_num(key, raw)?;
    if n == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(n)
}

impl AnalyticsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (absent keys keep their default).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("FORGEML_MODELS_DIR") {
            cfg.models_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("FORGEML_DATASETS_DIR") {
            cfg.datasets_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("FORGEML_SEED") {
            cfg.seed = parse_num("FORGEML_SEED", &v)?;
        }
        if let Some(v) = lookup("FORGEML_PROJECT_SAMPLES") {
            cfg.sizes.projects = parse_count("FORGEML_PROJECT_SAMPLES", &v)?;
        }
        if let Some(v) = lookup("FORGEML_CUSTOMER_SAMPLES") {
            cfg.sizes.customers = parse_count("FORGEML_CUSTOMER_SAMPLES", &v)?;
        }
        if let Some(v) = lookup("FORGEML_EMPLOYEE_SAMPLES") {
            cfg.sizes.employees = parse_count("FORGEML_EMPLOYEE_SAMPLES", &v)?;
        }
        if let Some(v) = lookup("FORGEML_INVENTORY_DAYS") {
            cfg.sizes.inventory_days = parse_count("FORGEML_INVENTORY_DAYS", &v)?;
        }
        if let Some(v) = lookup("FORGEML_FALLBACK_WINDOW") {
            cfg.fallback_window = parse_count("FORGEML_FALLBACK_WINDOW", &v)?;
        }
        if let Some(v) = lookup("FORGEML_LOG_FORMAT") {
            cfg.log_format = match v.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "FORGEML_LOG_FORMAT",
                        value: v,
                        reason: "expected json or pretty".to_string(),
                    });
                }
            };
        }

        cfg.training = TrainingConfig::with_seed(cfg.seed);
        Ok(cfg)
    }
}
