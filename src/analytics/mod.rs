//! Reliability and cost analytics over maintenance event data
//!
//! Every computation is a pure function of a [`Dataset`] snapshot, an
//! [`AnalysisWindow`] and an [`AnalyticsFilter`]. Sparse data never raises:
//! it shows up as `None` fields, empty lists or excluded assets. Malformed
//! data (events ending before they start, duplicate budgets, overlapping
//! labor rates, negative quantities) fails with
//! [`AnalyticsError::DataIntegrity`].
//!
//! # Computations
//!
//! - **MTBF / MTTR**: per-machine reliability with plant-wide summaries
//! - **Pareto**: 80/20 classification by machine, cause, downtime or cost
//! - **Failure modes**: breakdowns per cause category with monthly trends
//! - **Costs**: labor, parts, external and downtime totals with budget variance
//! - **Predictions**: next-failure forecasts from breakdown intervals
//!
//! # Example
//!
//! ```no_run
//! use cmms_analytics::analytics::{AnalyticsConfig, AnalyticsEngine, AnalyticsQuery};
//! use cmms_analytics::state::create_in_memory_store;
//! use chrono::Utc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = AnalyticsEngine::new(create_in_memory_store(), AnalyticsConfig::default());
//!
//!     let query = AnalyticsQuery::new(engine.default_window(Utc::now())?);
//!     let report = engine.mtbf(&query).await?;
//!     println!("{} machines, {} failures", report.summary.total_machines, report.summary.total_failures);
//!
//!     Ok(())
//! }
//! ```

mod cost;
mod dataset;
mod engine;
mod error;
mod failure_modes;
pub mod integrity;
mod pareto;
mod prediction;
mod rates;
mod reliability;
mod statistics;

pub use cost::{
    compute_budget_variance, compute_cost_summary, BudgetComparison, BudgetTotals,
    BudgetVarianceReport, CostSummary,
};
pub use dataset::{
    period_label, AnalysisWindow, AnalyticsFilter, Catalog, Dataset, UNCATEGORIZED_KEY,
    UNCATEGORIZED_NAME,
};
pub use engine::{AnalyticsConfig, AnalyticsEngine, AnalyticsQuery};
pub use error::{AnalyticsError, AnalyticsResult};
pub use failure_modes::{
    compute_failure_mode_breakdown, CategoryBreakdown, FailureModeReport, FailureModeSummary,
    MonthlyTrend,
};
pub use pareto::{
    classify, compute_pareto, ParetoDimension, ParetoGroup, ParetoItem, ParetoMeasure,
    ParetoReport, VITAL_FEW_THRESHOLD,
};
pub use prediction::{
    predict_failures, predict_next_failure, FailurePrediction, FailureSeverity,
    PredictionConfidence, PredictionReport, PredictionSummary, RejectedAsset, CRITICAL_DAYS,
    HIGH_DAYS, MEDIUM_DAYS, MIN_BREAKDOWNS_FOR_PREDICTION,
};
pub use rates::{CostSettings, LaborRateTable, RateSource, ResolvedRate};
pub use reliability::{
    compute_mtbf, compute_mttr, MachineMtbf, MachineMttr, MtbfReport, MtbfSummary, MttrReport,
    MttrSummary,
};
pub use statistics::{mean, percentage, Distribution};
