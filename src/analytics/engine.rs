//! Analytics engine: loads a snapshot from the store and runs a computation over it

use crate::analytics::cost::{
    compute_budget_variance, compute_cost_summary, BudgetVarianceReport, CostSummary,
};
use crate::analytics::dataset::{AnalysisWindow, AnalyticsFilter, Dataset};
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::failure_modes::{compute_failure_mode_breakdown, FailureModeReport};
use crate::analytics::pareto::{compute_pareto, ParetoDimension, ParetoReport};
use crate::analytics::prediction::{predict_failures, PredictionReport};
use crate::analytics::rates::CostSettings;
use crate::analytics::reliability::{compute_mtbf, compute_mttr, MtbfReport, MttrReport};
use crate::metrics;
use crate::models::EventType;
use crate::state::{EventFilter, MaintenanceStore};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Configuration for the analytics engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Cost rates applied to labor and downtime
    #[serde(default)]
    pub cost: CostSettings,

    /// Length of the trailing window used when a query names none
    #[serde(default = "default_window_days")]
    pub default_window_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            cost: CostSettings::default(),
            default_window_days: default_window_days(),
        }
    }
}

fn default_window_days() -> i64 {
    90
}

impl AnalyticsConfig {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.default_window_days <= 0 {
            return Err(AnalyticsError::InvalidConfiguration(format!(
                "default_window_days must be positive, got {}",
                self.default_window_days
            )));
        }
        self.cost.validate()
    }
}

/// Window, filter and reference date for one request
#[derive(Debug, Clone)]
pub struct AnalyticsQuery {
    pub window: AnalysisWindow,
    pub filter: AnalyticsFilter,
    /// Reference date for "current month" budget comparison and predictions
    pub as_of: DateTime<Utc>,
}

impl AnalyticsQuery {
    pub fn new(window: AnalysisWindow) -> Self {
        Self {
            window,
            filter: AnalyticsFilter::default(),
            as_of: Utc::now(),
        }
    }

    pub fn with_filter(mut self, filter: AnalyticsFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = as_of;
        self
    }

    fn event_filter(&self, window: &AnalysisWindow) -> EventFilter {
        EventFilter {
            asset_ids: self.filter.asset_ids.clone(),
            start: Some(window.start),
            end: Some(window.end),
            ..Default::default()
        }
    }
}

/// Main analytics engine
///
/// Stateless apart from its configuration; every call reads a fresh snapshot.
#[derive(Clone)]
pub struct AnalyticsEngine {
    store: Arc<dyn MaintenanceStore>,
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    /// Create a new analytics engine
    pub fn new(store: Arc<dyn MaintenanceStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Trailing window of `default_window_days` ending at `now`
    pub fn default_window(&self, now: DateTime<Utc>) -> AnalyticsResult<AnalysisWindow> {
        AnalysisWindow::trailing_days(now, self.config.default_window_days)
    }

    async fn load(&self, filter: &EventFilter) -> AnalyticsResult<Dataset> {
        let result = self.store.snapshot(filter).await;
        metrics::record_storage("snapshot", result.is_ok());
        result.map_err(|e| AnalyticsError::Storage(e.to_string()))
    }

    /// Load a snapshot, run `compute` over it and record the outcome
    async fn run<T, F>(
        &self,
        operation: &'static str,
        filter: &EventFilter,
        compute: F,
    ) -> AnalyticsResult<T>
    where
        F: FnOnce(&Dataset) -> AnalyticsResult<T>,
    {
        let started = Instant::now();
        let result = match self.load(filter).await {
            Ok(dataset) => compute(&dataset),
            Err(e) => Err(e),
        };
        let elapsed = started.elapsed();

        match &result {
            Ok(_) => {
                metrics::record_computation(operation, "success", elapsed);
                tracing::debug!(
                    operation,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Analytics computation completed"
                );
            }
            Err(e) => {
                metrics::record_computation(operation, e.kind(), elapsed);
                if let AnalyticsError::DataIntegrity(_) = e {
                    metrics::DATA_INTEGRITY_ERRORS_TOTAL
                        .with_label_values(&[operation])
                        .inc();
                }
                tracing::warn!(operation, error = %e, "Analytics computation failed");
            }
        }

        result
    }

    pub async fn mtbf(&self, query: &AnalyticsQuery) -> AnalyticsResult<MtbfReport> {
        let filter = query.event_filter(&query.window);
        self.run("mtbf", &filter, |dataset| {
            compute_mtbf(dataset, &query.window, &query.filter)
        })
        .await
    }

    pub async fn mttr(&self, query: &AnalyticsQuery) -> AnalyticsResult<MttrReport> {
        let filter = query.event_filter(&query.window);
        self.run("mttr", &filter, |dataset| {
            compute_mttr(dataset, &query.window, &query.filter)
        })
        .await
    }

    pub async fn pareto(
        &self,
        query: &AnalyticsQuery,
        dimension: ParetoDimension,
    ) -> AnalyticsResult<ParetoReport> {
        let filter = query.event_filter(&query.window);
        self.run("pareto", &filter, |dataset| {
            compute_pareto(dataset, &query.window, &query.filter, dimension, &self.config.cost)
        })
        .await
    }

    pub async fn failure_modes(&self, query: &AnalyticsQuery) -> AnalyticsResult<FailureModeReport> {
        let filter = query.event_filter(&query.window);
        self.run("failure_modes", &filter, |dataset| {
            compute_failure_mode_breakdown(dataset, &query.window, &query.filter)
        })
        .await
    }

    /// Cost summary for the query window plus the budget of the `as_of` month
    pub async fn cost_summary(&self, query: &AnalyticsQuery) -> AnalyticsResult<CostSummary> {
        let budget_month = AnalysisWindow::for_month(query.as_of.year(), query.as_of.month())?;
        // Budget actuals are plant-wide, so the asset filter is applied in memory only
        let filter = EventFilter {
            asset_ids: Vec::new(),
            ..query.event_filter(&query.window.union(&budget_month))
        };

        self.run("cost_summary", &filter, |dataset| {
            compute_cost_summary(
                dataset,
                &query.window,
                &query.filter,
                &self.config.cost,
                query.as_of,
            )
        })
        .await
    }

    pub async fn budget_variance(&self, year: i32) -> AnalyticsResult<BudgetVarianceReport> {
        let window = AnalysisWindow::for_year(year)?;
        let filter = EventFilter {
            start: Some(window.start),
            end: Some(window.end),
            ..Default::default()
        };

        self.run("budget_variance", &filter, |dataset| {
            compute_budget_variance(dataset, year, &self.config.cost)
        })
        .await
    }

    /// Failure forecasts over the full breakdown history up to `now`
    pub async fn predictions(
        &self,
        filter: &AnalyticsFilter,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<PredictionReport> {
        let event_filter = EventFilter {
            asset_ids: filter.asset_ids.clone(),
            event_types: vec![EventType::Breakdown],
            ..Default::default()
        };

        let report = self
            .run("predictions", &event_filter, |dataset| {
                predict_failures(dataset, filter, now)
            })
            .await?;

        if !report.rejected.is_empty() {
            metrics::PREDICTION_REJECTED_ASSETS_TOTAL
                .with_label_values(&["data_integrity"])
                .inc_by(report.rejected.len() as f64);
        }

        Ok(report)
    }
}
