use std::sync::Arc;

use common::config::Settings;
use common::db::DbPool;
use metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub config: Arc<Settings>,
    /// Handle to the recorder installed at startup; /metrics renders it
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Create a new AppState instance
    pub fn new(db_pool: DbPool, config: Settings, metrics: PrometheusHandle) -> Self {
        Self {
            db_pool,
            config: Arc::new(config),
            metrics,
        }
    }
}
