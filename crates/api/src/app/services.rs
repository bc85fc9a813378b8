use chrono::{NaiveDate, Utc};
use tracing::info;

use forgeml_core::DomainResult;
use forgeml_infra::{AnalyticsConfig, ForecastEngine, ModelLifecycleManager};

/// Everything a request handler needs.
pub struct AppServices {
    pub lifecycle: ModelLifecycleManager,
    pub forecaster: ForecastEngine,
    today: Option<NaiveDate>,
}

impl AppServices {
    pub fn new(lifecycle: ModelLifecycleManager) -> Self {
        Self {
            lifecycle,
            forecaster: ForecastEngine::new(),
            today: None,
        }
    }

    /// Pin the date used for derived calendar fields (defaults to today, UTC).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// File-backed lifecycle under the configured directories.
pub fn build_services(config: &AnalyticsConfig) -> DomainResult<AppServices> {
    let lifecycle = ModelLifecycleManager::from_config(config)?;
    info!(
        models_dir = %config.models_dir.display(),
        datasets_dir = %config.datasets_dir.display(),
        seed = config.seed,
        fallback_window = config.fallback_window,
        "analytics services built"
    );
    let mut services = AppServices::new(lifecycle);
    services.forecaster = ForecastEngine::new().with_fallback_window(config.fallback_window);
    Ok(services)
}
