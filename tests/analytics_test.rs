//! Analytics engine tests against a seeded in-memory store

mod common;

use chrono::NaiveDate;
use cmms_analytics::analytics::*;
use cmms_analytics::models::{EventType, LaborRate, MaintenanceEvent, RateScope};
use cmms_analytics::state::{InMemoryStore, MaintenanceStore};
use common::{may, may_window, seed_plant};
use std::sync::Arc;

async fn seeded_engine(config: AnalyticsConfig) -> (AnalyticsEngine, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    seed_plant(store.as_ref()).await;
    (AnalyticsEngine::new(store.clone(), config), store)
}

fn may_query() -> AnalyticsQuery {
    AnalyticsQuery::new(may_window()).with_as_of(may(25, 0))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[tokio::test]
async fn test_mtbf_per_machine() {
    let (engine, _) = seeded_engine(AnalyticsConfig::default()).await;

    let report = engine.mtbf(&may_query()).await.unwrap();

    let ids: Vec<&str> = report.machines.iter().map(|m| m.asset_id.as_str()).collect();
    assert_eq!(ids, vec!["LATHE-2", "PRESS-1", "PUMP-3"]);

    let press = &report.machines[1];
    assert_eq!(press.asset_name, "Hydraulic Press");
    assert_eq!(press.failure_count, 3);
    assert_close(press.mtbf_hours.unwrap(), 200.0 / 3.0);

    let pump = &report.machines[2];
    assert_eq!(pump.failure_count, 0);
    assert!(pump.mtbf_hours.is_none());

    assert_eq!(report.summary.machines_with_failures, 2);
    assert_close(
        report.summary.average_mtbf_hours.unwrap(),
        (200.0 / 3.0 + 200.0) / 2.0,
    );
}

#[tokio::test]
async fn test_mttr_excludes_open_and_preventive_work() {
    let (engine, _) = seeded_engine(AnalyticsConfig::default()).await;

    let report = engine.mttr(&may_query()).await.unwrap();

    assert_eq!(report.machines.len(), 2);
    let press = report
        .machines
        .iter()
        .find(|m| m.asset_id == "PRESS-1")
        .unwrap();
    assert_eq!(press.repair_count, 2);
    assert_close(press.mttr_minutes, 180.0);

    let lathe = report
        .machines
        .iter()
        .find(|m| m.asset_id == "LATHE-2")
        .unwrap();
    assert_eq!(lathe.repair_count, 1);
    assert_close(lathe.mttr_hours, 6.0);

    assert_close(report.summary.average_mttr_minutes.unwrap(), 270.0);
}

#[tokio::test]
async fn test_pareto_dimensions() {
    let (engine, _) = seeded_engine(AnalyticsConfig::default()).await;
    let query = may_query();

    let causes = engine.pareto(&query, ParetoDimension::Causes).await.unwrap();
    let ids: Vec<&str> = causes.data.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["HYD", "ELEC", "MECH"]);
    assert_eq!(causes.total, 4.0);
    assert_eq!(causes.data[0].measure, ParetoMeasure::Count(2));
    assert_close(causes.data[1].cumulative_percentage, 75.0);
    assert_eq!(causes.vital_few_count, 3);

    let downtime = engine.pareto(&query, ParetoDimension::Downtime).await.unwrap();
    let ids: Vec<&str> = downtime.data.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["LATHE-2", "PRESS-1"], "ties ordered by id");
    assert_close(downtime.total, 12.0);

    let costs = engine.pareto(&query, ParetoDimension::Costs).await.unwrap();
    assert_eq!(costs.data[0].id, "PRESS-1");
    assert_eq!(costs.data[0].measure, ParetoMeasure::TotalCost(700.0));
    assert_close(costs.total, 1160.0);
}

#[tokio::test]
async fn test_failure_modes() {
    let (engine, _) = seeded_engine(AnalyticsConfig::default()).await;

    let report = engine.failure_modes(&may_query()).await.unwrap();

    let hydraulic = &report.by_category[0];
    assert_eq!(hydraulic.category_name, "Hydraulic");
    assert_eq!(hydraulic.count, 2);
    assert_eq!(hydraulic.machines_affected, 1);
    assert_close(hydraulic.avg_repair_time_hours.unwrap(), 3.0);
    assert_close(hydraulic.percentage, 50.0);

    let electrical = report
        .by_category
        .iter()
        .find(|c| c.category_id.as_deref() == Some("ELEC"))
        .unwrap();
    assert!(electrical.avg_repair_time_hours.is_none());

    assert_eq!(report.summary.total_breakdowns, 4);
    assert_eq!(report.summary.uncategorized_breakdowns, 0);
    assert_eq!(report.monthly_trends.len(), 3);
    assert!(report.monthly_trends.iter().all(|t| t.period == "2024-05"));
}

#[tokio::test]
async fn test_cost_summary_without_downtime_rate() {
    let (engine, _) = seeded_engine(AnalyticsConfig::default()).await;

    let summary = engine.cost_summary(&may_query()).await.unwrap();

    assert_close(summary.labor_total, 760.0);
    assert_close(summary.parts_total, 400.0);
    assert_close(summary.downtime_hours, 12.0);
    assert!(summary.downtime_total.is_none());
    assert_close(summary.grand_total, 1160.0);
    assert_eq!(summary.work_order_count, 5);

    let budget = summary.budget.unwrap();
    assert_close(budget.budgeted_total, 2000.0);
    assert_close(budget.actual_total, 1160.0);
    assert_close(budget.variance, 840.0);
    assert!(!budget.is_over_budget);
    assert_close(budget.percentage_used.unwrap(), 58.0);
}

#[tokio::test]
async fn test_cost_summary_with_downtime_rate() {
    let config = AnalyticsConfig {
        cost: CostSettings {
            downtime_cost_per_hour: Some(150.0),
            ..CostSettings::default()
        },
        ..AnalyticsConfig::default()
    };
    let (engine, _) = seeded_engine(config).await;

    let summary = engine.cost_summary(&may_query()).await.unwrap();

    assert_close(summary.downtime_total.unwrap(), 1800.0);
    assert_close(summary.grand_total, 2960.0);
    // Derived downtime cost is not budget spend
    assert_close(summary.budget.unwrap().actual_total, 1160.0);
}

#[tokio::test]
async fn test_filters_narrow_results() {
    let (engine, _) = seeded_engine(AnalyticsConfig::default()).await;

    let line_b = may_query().with_filter(AnalyticsFilter::new().with_location("Line B"));
    let report = engine.mtbf(&line_b).await.unwrap();
    assert_eq!(report.machines.len(), 1);
    assert_eq!(report.machines[0].asset_id, "PUMP-3");
    assert_eq!(report.summary.total_failures, 0);

    let press_only =
        may_query().with_filter(AnalyticsFilter::new().with_asset_ids(vec!["PRESS-1".into()]));
    let summary = engine.cost_summary(&press_only).await.unwrap();
    assert_close(summary.labor_total, 300.0);
    // Budget actuals stay plant-wide
    assert_close(summary.budget.unwrap().actual_total, 1160.0);

    let electricians = may_query().with_filter(AnalyticsFilter::new().with_role("electrician"));
    let summary = engine.cost_summary(&electricians).await.unwrap();
    assert_eq!(summary.work_order_count, 0);
}

#[tokio::test]
async fn test_budget_variance_year() {
    let (engine, _) = seeded_engine(AnalyticsConfig::default()).await;

    let report = engine.budget_variance(2024).await.unwrap();
    assert_eq!(report.months.len(), 1);
    assert_eq!(report.months[0].month, 5);
    assert_close(report.totals.variance, 840.0);

    let empty = engine.budget_variance(2023).await.unwrap();
    assert!(empty.months.is_empty());
    assert!(empty.totals.percentage_used.is_none());
}

#[tokio::test]
async fn test_predictions_exclude_sparse_history() {
    let (engine, _) = seeded_engine(AnalyticsConfig::default()).await;

    let report = engine
        .predictions(&AnalyticsFilter::new(), may(25, 0))
        .await
        .unwrap();

    assert_eq!(report.predictions.len(), 1);
    let press = &report.predictions[0];
    assert_eq!(press.asset_id, "PRESS-1");
    assert_eq!(press.breakdown_count, 3);
    assert_close(press.average_days_between_failures, 9.0);
    assert_eq!(press.predicted_failure_date, may(29, 8));
    assert_eq!(press.days_until_failure, 4);
    assert_eq!(press.severity, FailureSeverity::Critical);
    assert_eq!(press.confidence, PredictionConfidence::Low);

    assert_eq!(report.summary.excluded_assets, 2);
    assert_eq!(report.summary.critical, 1);
}

#[tokio::test]
async fn test_overlapping_labor_rates_fail_computation() {
    let (engine, store) = seeded_engine(AnalyticsConfig::default()).await;
    store
        .save_labor_rate(&LaborRate::new(
            RateScope::Role("mechanic".into()),
            55.0,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ))
        .await
        .unwrap();

    let result = engine.cost_summary(&may_query()).await;
    assert!(matches!(result, Err(AnalyticsError::DataIntegrity(_))));

    let result = engine.predictions(&AnalyticsFilter::new(), may(25, 0)).await;
    assert!(matches!(result, Err(AnalyticsError::DataIntegrity(_))));
}

#[tokio::test]
async fn test_malformed_event_rejected_only_for_its_asset() {
    let (engine, store) = seeded_engine(AnalyticsConfig::default()).await;
    for day in [1, 8] {
        store
            .save_event(&MaintenanceEvent::new("LATHE-2", EventType::Breakdown, may(day, 6)))
            .await
            .unwrap();
    }
    store
        .save_event(
            &MaintenanceEvent::new("LATHE-2", EventType::Breakdown, may(12, 6)).with_end(may(12, 5)),
        )
        .await
        .unwrap();

    let report = engine
        .predictions(&AnalyticsFilter::new(), may(25, 0))
        .await
        .unwrap();
    assert_eq!(report.predictions.len(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].asset_id, "LATHE-2");

    // Window computations fail as a whole
    assert!(engine.mttr(&may_query()).await.is_err());
}

#[tokio::test]
async fn test_empty_window_is_not_an_error() {
    let (engine, _) = seeded_engine(AnalyticsConfig::default()).await;
    let june = AnalyticsQuery::new(AnalysisWindow::for_month(2024, 6).unwrap())
        .with_as_of(may(25, 0));

    let mttr = engine.mttr(&june).await.unwrap();
    assert!(mttr.machines.is_empty());
    assert!(mttr.summary.average_mttr_minutes.is_none());

    let pareto = engine.pareto(&june, ParetoDimension::Machines).await.unwrap();
    assert!(pareto.data.is_empty());
    assert_eq!(pareto.vital_few_count, 0);

    let modes = engine.failure_modes(&june).await.unwrap();
    assert!(modes.by_category.is_empty());
}
