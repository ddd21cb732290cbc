//! Storage backends produce identical analytics

mod common;

use cmms_analytics::analytics::{AnalyticsConfig, AnalyticsEngine, AnalyticsFilter, AnalyticsQuery, ParetoDimension};
use cmms_analytics::config::{StateBackend, StateConfig};
use cmms_analytics::models::BudgetPeriod;
use cmms_analytics::state::{create_store, EventFilter, InMemoryStore, MaintenanceStore, SledStore};
use cmms_analytics::AppError;
use common::{may, may_window, seed_plant};
use std::sync::Arc;
use tempfile::TempDir;

async fn reports(store: Arc<dyn MaintenanceStore>) -> serde_json::Value {
    let engine = AnalyticsEngine::new(store, AnalyticsConfig::default());
    let query = AnalyticsQuery::new(may_window()).with_as_of(may(25, 0));

    serde_json::json!({
        "mtbf": engine.mtbf(&query).await.unwrap(),
        "mttr": engine.mttr(&query).await.unwrap(),
        "pareto": engine.pareto(&query, ParetoDimension::Costs).await.unwrap(),
        "failure_modes": engine.failure_modes(&query).await.unwrap(),
        "costs": engine.cost_summary(&query).await.unwrap(),
        "budget": engine.budget_variance(2024).await.unwrap(),
        "predictions": engine.predictions(&AnalyticsFilter::new(), may(25, 0)).await.unwrap(),
    })
}

#[tokio::test]
async fn test_sled_and_memory_backends_agree() {
    let temp_dir = TempDir::new().unwrap();

    let memory = Arc::new(InMemoryStore::new());
    seed_plant(memory.as_ref()).await;

    let sled = Arc::new(SledStore::new(temp_dir.path()).unwrap());
    seed_plant(sled.as_ref()).await;

    assert_eq!(reports(memory).await, reports(sled).await);
}

#[tokio::test]
async fn test_sled_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = StateConfig {
        backend: StateBackend::Sled,
        path: Some(temp_dir.path().to_path_buf()),
    };

    {
        let store = SledStore::new(temp_dir.path()).unwrap();
        seed_plant(&store).await;
        store.flush().await.unwrap();
    }

    let store = create_store(&config).await.unwrap();
    let events = store.list_events(&EventFilter::default()).await.unwrap();
    assert_eq!(events.len(), common::plant_events().len());
    assert_eq!(store.list_assets().await.unwrap().len(), 3);

    // The seeded May budget still blocks a second write
    let result = store.save_budget(&BudgetPeriod::new(2024, 5, 1.0, 1.0)).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let summary = reports(store).await;
    assert_eq!(summary["costs"]["grandTotal"], 1160.0);
}

#[tokio::test]
async fn test_snapshot_pushes_down_event_filter() {
    let store = Arc::new(InMemoryStore::new());
    seed_plant(store.as_ref()).await;

    let filter = EventFilter {
        asset_ids: vec!["LATHE-2".to_string()],
        start: Some(may(1, 0)),
        end: Some(may(10, 0)),
        ..Default::default()
    };
    let dataset = store.snapshot(&filter).await.unwrap();

    assert_eq!(dataset.events.len(), 1);
    assert_eq!(dataset.events[0].asset_id, "LATHE-2");
    // Reference data is never filtered
    assert_eq!(dataset.assets.len(), 3);
    assert_eq!(dataset.budgets.len(), 1);
}
