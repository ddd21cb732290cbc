//! Breakdown counts per cause category with monthly trends

use crate::analytics::dataset::{
    period_label, AnalysisWindow, AnalyticsFilter, Catalog, Dataset, UNCATEGORIZED_KEY,
};
use crate::analytics::error::AnalyticsResult;
use crate::analytics::integrity;
use crate::analytics::statistics::{mean, percentage};
use crate::models::MaintenanceEvent;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// `None` for the uncategorized bucket
    pub category_id: Option<String>,
    pub category_name: String,
    pub count: u64,
    pub machines_affected: usize,
    /// `None` when no breakdown in the category has been closed
    pub avg_repair_time_hours: Option<f64>,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub period: String,
    pub category_id: Option<String>,
    pub category_name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureModeSummary {
    pub total_breakdowns: u64,
    pub categorized_breakdowns: u64,
    pub uncategorized_breakdowns: u64,
    pub category_count: usize,
    pub top_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureModeReport {
    pub by_category: Vec<CategoryBreakdown>,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub summary: FailureModeSummary,
}

struct CategoryAccumulator<'a> {
    category_id: Option<&'a str>,
    count: u64,
    assets: HashSet<&'a str>,
    repair_hours: Vec<f64>,
}

impl<'a> CategoryAccumulator<'a> {
    fn new(category_id: Option<&'a str>) -> Self {
        Self {
            category_id,
            count: 0,
            assets: HashSet::new(),
            repair_hours: Vec::new(),
        }
    }
}

/// Map key for a category bucket
///
/// The sentinel only places the uncategorized bucket among the real ids; the
/// flag keeps it apart from a real category that happens to share the id.
fn bucket_key(category_id: Option<&str>) -> (&str, bool) {
    (category_id.unwrap_or(UNCATEGORIZED_KEY), category_id.is_none())
}

/// Group breakdowns in the window by cause category
///
/// All breakdowns without a category land in a single bucket keyed by
/// [`UNCATEGORIZED_KEY`], ordered alongside the real categories.
pub fn compute_failure_mode_breakdown(
    dataset: &Dataset,
    window: &AnalysisWindow,
    filter: &AnalyticsFilter,
) -> AnalyticsResult<FailureModeReport> {
    integrity::validate_dataset(dataset)?;
    let catalog = Catalog::new(dataset);

    let breakdowns: Vec<&MaintenanceEvent> = dataset
        .events
        .iter()
        .filter(|e| {
            e.is_breakdown() && window.contains(e.started_at) && filter.matches_event(e, &catalog)
        })
        .collect();

    let mut categories: BTreeMap<(&str, bool), CategoryAccumulator> = BTreeMap::new();
    let mut trends: BTreeMap<(String, (&str, bool)), (Option<&str>, u64)> = BTreeMap::new();

    for &event in &breakdowns {
        let category_id = event.cause_category_id.as_deref();
        let key = bucket_key(category_id);

        let acc = categories
            .entry(key)
            .or_insert_with(|| CategoryAccumulator::new(category_id));
        acc.count += 1;
        acc.assets.insert(event.asset_id.as_str());
        if let Some(hours) = event.repair_hours() {
            acc.repair_hours.push(hours);
        }

        trends
            .entry((period_label(event.started_at), key))
            .or_insert((category_id, 0))
            .1 += 1;
    }

    let total = breakdowns.len() as u64;

    let mut by_category: Vec<CategoryBreakdown> = categories
        .into_values()
        .map(|acc| CategoryBreakdown {
            category_id: acc.category_id.map(str::to_string),
            category_name: catalog.category_name(acc.category_id),
            count: acc.count,
            machines_affected: acc.assets.len(),
            avg_repair_time_hours: mean(&acc.repair_hours),
            percentage: percentage(acc.count as f64, total as f64).unwrap_or(0.0),
        })
        .collect();

    // BTreeMap iteration already ordered by key; stable sort keeps it for ties
    by_category.sort_by(|a, b| b.count.cmp(&a.count));

    let monthly_trends = trends
        .into_iter()
        .map(|((period, _), (category_id, count))| MonthlyTrend {
            period,
            category_id: category_id.map(str::to_string),
            category_name: catalog.category_name(category_id),
            count,
        })
        .collect();

    let uncategorized_breakdowns = breakdowns
        .iter()
        .filter(|e| e.cause_category_id.is_none())
        .count() as u64;

    let summary = FailureModeSummary {
        total_breakdowns: total,
        categorized_breakdowns: total - uncategorized_breakdowns,
        uncategorized_breakdowns,
        category_count: by_category.len(),
        top_category: by_category.first().map(|c| c.category_name.clone()),
    };

    Ok(FailureModeReport {
        by_category,
        monthly_trends,
        summary,
    })
}
