//! Input integrity checks
//!
//! Malformed records are surfaced as [`AnalyticsError::DataIntegrity`] and
//! never silently repaired.

use crate::analytics::dataset::Dataset;
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::models::{BudgetPeriod, LaborRate, MaintenanceEvent, RateScope};
use std::collections::{HashMap, HashSet};

/// Validate every collection of the snapshot
pub fn validate_dataset(dataset: &Dataset) -> AnalyticsResult<()> {
    validate_events(&dataset.events)?;
    validate_budgets(&dataset.budgets)?;
    validate_labor_rates(&dataset.labor_rates)?;
    Ok(())
}

pub fn validate_events(events: &[MaintenanceEvent]) -> AnalyticsResult<()> {
    events.iter().try_for_each(validate_event)
}

/// Check a single event: closed after it started, finite non-negative quantities
pub fn validate_event(event: &MaintenanceEvent) -> AnalyticsResult<()> {
    if let Some(ended_at) = event.ended_at {
        if ended_at < event.started_at {
            return Err(AnalyticsError::DataIntegrity(format!(
                "Event {} on asset {} ends ({}) before it starts ({})",
                event.id, event.asset_id, ended_at, event.started_at
            )));
        }
    }

    let quantities = [
        ("labor_hours", event.labor_hours),
        ("overtime_hours", event.overtime_hours),
        ("parts_cost", event.parts_cost),
        ("external_cost", event.external_cost),
        ("downtime_hours", event.downtime_hours),
    ];
    for (field, value) in quantities {
        if !value.is_finite() || value < 0.0 {
            return Err(AnalyticsError::DataIntegrity(format!(
                "Event {} has invalid {}: {}",
                event.id, field, value
            )));
        }
    }

    if event.overtime_hours > event.labor_hours {
        return Err(AnalyticsError::DataIntegrity(format!(
            "Event {} books {} overtime hours but only {} labor hours",
            event.id, event.overtime_hours, event.labor_hours
        )));
    }

    Ok(())
}

/// At most one budget per (year, month)
pub fn validate_budgets(budgets: &[BudgetPeriod]) -> AnalyticsResult<()> {
    let mut seen = HashSet::new();
    for budget in budgets {
        if !(1..=12).contains(&budget.month) {
            return Err(AnalyticsError::DataIntegrity(format!(
                "Budget period {}-{} has an invalid month",
                budget.year, budget.month
            )));
        }
        if budget.budgeted_labor < 0.0 || budget.budgeted_parts < 0.0 {
            return Err(AnalyticsError::DataIntegrity(format!(
                "Budget period {}-{:02} has a negative amount",
                budget.year, budget.month
            )));
        }
        if !seen.insert(budget.key()) {
            return Err(AnalyticsError::DataIntegrity(format!(
                "Duplicate budget period {}-{:02}",
                budget.year, budget.month
            )));
        }
    }
    Ok(())
}

/// Rates sharing a scope must have disjoint validity windows
pub fn validate_labor_rates(rates: &[LaborRate]) -> AnalyticsResult<()> {
    let mut by_scope: HashMap<&RateScope, Vec<&LaborRate>> = HashMap::new();

    for rate in rates {
        if !rate.hourly_rate.is_finite() || rate.hourly_rate < 0.0 {
            return Err(AnalyticsError::DataIntegrity(format!(
                "Labor rate {} ({}) has invalid hourly rate {}",
                rate.id, rate.scope, rate.hourly_rate
            )));
        }
        if !rate.has_valid_window() {
            return Err(AnalyticsError::DataIntegrity(format!(
                "Labor rate {} ({}) ends before it becomes effective",
                rate.id, rate.scope
            )));
        }
        by_scope.entry(&rate.scope).or_default().push(rate);
    }

    for (scope, mut scoped) in by_scope {
        scoped.sort_by_key(|r| r.effective_from);
        for pair in scoped.windows(2) {
            if pair[0].overlaps(pair[1]) {
                return Err(AnalyticsError::DataIntegrity(format!(
                    "Overlapping labor rates {} and {} for {}",
                    pair[0].id, pair[1].id, scope
                )));
            }
        }
    }

    Ok(())
}
