//! Maintenance cost totals and budget variance

use crate::analytics::dataset::{AnalysisWindow, AnalyticsFilter, Catalog, Dataset};
use crate::analytics::error::AnalyticsResult;
use crate::analytics::integrity;
use crate::analytics::rates::{CostSettings, LaborRateTable};
use crate::analytics::statistics::percentage;
use crate::models::{BudgetPeriod, MaintenanceEvent};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Cost totals for a window
///
/// `downtime_total` is `None` when no downtime cost rate is configured, and
/// labor hours without an applicable rate are reported in
/// `unpriced_labor_hours` instead of being priced at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub labor_total: f64,
    pub labor_hours: f64,
    pub unpriced_labor_hours: f64,
    pub parts_total: f64,
    pub external_total: f64,
    pub downtime_hours: f64,
    pub downtime_total: Option<f64>,
    pub grand_total: f64,
    pub work_order_count: usize,
    /// Budget comparison for the current month, when a budget exists
    pub budget: Option<BudgetComparison>,
}

/// Budgeted against actual spend for one month
///
/// Labor hours without an applicable rate are not part of `actual_labor`,
/// `variance` or `percentage_used`; they are counted in
/// `unpriced_labor_hours`, so a non-zero value means the actuals are a lower
/// bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetComparison {
    pub year: i32,
    pub month: u32,
    pub budgeted_labor: f64,
    pub budgeted_parts: f64,
    pub budgeted_total: f64,
    pub actual_labor: f64,
    pub actual_parts: f64,
    pub actual_external: f64,
    pub actual_total: f64,
    pub unpriced_labor_hours: f64,
    /// Budgeted minus actual; negative means over budget
    pub variance: f64,
    pub is_over_budget: bool,
    /// `None` when nothing was budgeted
    pub percentage_used: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetTotals {
    pub budgeted_total: f64,
    pub actual_total: f64,
    /// Unpriced labor hours across all budgeted months, excluded from `variance`
    pub unpriced_labor_hours: f64,
    pub variance: f64,
    pub is_over_budget: bool,
    pub percentage_used: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetVarianceReport {
    pub year: i32,
    pub months: Vec<BudgetComparison>,
    pub totals: BudgetTotals,
}

#[derive(Debug, Default)]
struct CostTotals {
    labor: f64,
    labor_hours: f64,
    unpriced_hours: f64,
    parts: f64,
    external: f64,
    downtime_hours: f64,
    work_orders: usize,
}

impl CostTotals {
    fn collect<'a, I>(events: I, rates: &LaborRateTable<'_>) -> Self
    where
        I: IntoIterator<Item = &'a MaintenanceEvent>,
    {
        let mut totals = CostTotals::default();
        for event in events {
            totals.work_orders += 1;
            totals.labor_hours += event.labor_hours;
            match rates.labor_cost(event) {
                Some(cost) => totals.labor += cost,
                None => totals.unpriced_hours += event.labor_hours,
            }
            totals.parts += event.parts_cost;
            totals.external += event.external_cost;
            totals.downtime_hours += event.downtime_hours;
        }
        totals
    }

    /// Money actually spent (derived downtime cost excluded)
    fn spend(&self) -> f64 {
        self.labor + self.parts + self.external
    }
}

fn compare(budget: &BudgetPeriod, actual: &CostTotals) -> BudgetComparison {
    let budgeted_total = budget.budgeted_total();
    let actual_total = actual.spend();
    let variance = budgeted_total - actual_total;

    BudgetComparison {
        year: budget.year,
        month: budget.month,
        budgeted_labor: budget.budgeted_labor,
        budgeted_parts: budget.budgeted_parts,
        budgeted_total,
        actual_labor: actual.labor,
        actual_parts: actual.parts,
        actual_external: actual.external,
        actual_total,
        unpriced_labor_hours: actual.unpriced_hours,
        variance,
        is_over_budget: variance < 0.0,
        percentage_used: percentage(actual_total, budgeted_total),
    }
}

/// Plant-wide spend for one calendar month; budgets are not split by asset
fn month_actuals(
    dataset: &Dataset,
    year: i32,
    month: u32,
    rates: &LaborRateTable<'_>,
) -> AnalyticsResult<CostTotals> {
    let window = AnalysisWindow::for_month(year, month)?;
    Ok(CostTotals::collect(
        dataset.events.iter().filter(|e| window.contains(e.started_at)),
        rates,
    ))
}

/// Cost totals for the window plus the budget comparison for the month of `as_of`
pub fn compute_cost_summary(
    dataset: &Dataset,
    window: &AnalysisWindow,
    filter: &AnalyticsFilter,
    settings: &CostSettings,
    as_of: DateTime<Utc>,
) -> AnalyticsResult<CostSummary> {
    integrity::validate_dataset(dataset)?;
    let catalog = Catalog::new(dataset);
    let rates = LaborRateTable::new(&dataset.labor_rates, settings);

    let totals = CostTotals::collect(
        dataset
            .events
            .iter()
            .filter(|e| window.contains(e.started_at) && filter.matches_event(e, &catalog)),
        &rates,
    );

    let downtime_total = settings
        .downtime_cost_per_hour
        .map(|rate| totals.downtime_hours * rate);

    if downtime_total.is_none() && totals.downtime_hours > 0.0 {
        tracing::debug!(
            downtime_hours = totals.downtime_hours,
            "No downtime cost rate configured; downtime cost unavailable"
        );
    }
    if totals.unpriced_hours > 0.0 {
        tracing::warn!(
            unpriced_hours = totals.unpriced_hours,
            "Labor hours without an applicable rate excluded from labor total"
        );
    }

    let budget = match dataset.budget_for(as_of.year(), as_of.month()) {
        Some(period) => {
            let actual = month_actuals(dataset, period.year, period.month, &rates)?;
            Some(compare(period, &actual))
        }
        None => None,
    };

    Ok(CostSummary {
        labor_total: totals.labor,
        labor_hours: totals.labor_hours,
        unpriced_labor_hours: totals.unpriced_hours,
        parts_total: totals.parts,
        external_total: totals.external,
        downtime_hours: totals.downtime_hours,
        downtime_total,
        grand_total: totals.spend() + downtime_total.unwrap_or(0.0),
        work_order_count: totals.work_orders,
        budget,
    })
}

/// Budget against actual for every budgeted month of a year
pub fn compute_budget_variance(
    dataset: &Dataset,
    year: i32,
    settings: &CostSettings,
) -> AnalyticsResult<BudgetVarianceReport> {
    integrity::validate_dataset(dataset)?;
    let rates = LaborRateTable::new(&dataset.labor_rates, settings);

    let mut periods: Vec<&BudgetPeriod> = dataset.budgets.iter().filter(|b| b.year == year).collect();
    periods.sort_by_key(|b| b.month);

    let months = periods
        .into_iter()
        .map(|period| {
            month_actuals(dataset, period.year, period.month, &rates)
                .map(|actual| compare(period, &actual))
        })
        .collect::<AnalyticsResult<Vec<_>>>()?;

    let budgeted_total: f64 = months.iter().map(|m| m.budgeted_total).sum();
    let actual_total: f64 = months.iter().map(|m| m.actual_total).sum();
    let unpriced_labor_hours: f64 = months.iter().map(|m| m.unpriced_labor_hours).sum();
    let variance = budgeted_total - actual_total;

    Ok(BudgetVarianceReport {
        year,
        months,
        totals: BudgetTotals {
            budgeted_total,
            actual_total,
            unpriced_labor_hours,
            variance,
            is_over_budget: variance < 0.0,
            percentage_used: percentage(actual_total, budgeted_total),
        },
    })
}
