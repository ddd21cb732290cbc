pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::analytics::{AnalyticsConfig, AnalyticsEngine};
use crate::state::MaintenanceStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MaintenanceStore>,
    pub engine: Arc<AnalyticsEngine>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn MaintenanceStore>, config: AnalyticsConfig) -> Self {
        Self {
            engine: Arc::new(AnalyticsEngine::new(store.clone(), config)),
            store,
            started_at: Instant::now(),
        }
    }
}
