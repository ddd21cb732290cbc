//! Pareto (80/20) classification over machines, causes, downtime and cost

use crate::analytics::dataset::{
    AnalysisWindow, AnalyticsFilter, Catalog, Dataset, UNCATEGORIZED_KEY,
};
use crate::analytics::error::AnalyticsResult;
use crate::analytics::integrity;
use crate::analytics::rates::{CostSettings, LaborRateTable};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Cumulative share (percent) at which the vital few end
pub const VITAL_FEW_THRESHOLD: f64 = 80.0;

const CUMULATIVE_TOLERANCE: f64 = 1e-9;

/// What the Pareto analysis groups and measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParetoDimension {
    /// Breakdown count per asset
    Machines,
    /// Breakdown count per cause category
    Causes,
    /// Downtime hours per asset
    Downtime,
    /// Maintenance cost per asset
    Costs,
}

/// Measured quantity of a Pareto item, serialized under its own field name
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParetoMeasure {
    #[serde(rename = "count")]
    Count(u64),
    #[serde(rename = "totalHours")]
    TotalHours(f64),
    #[serde(rename = "totalCost")]
    TotalCost(f64),
}

impl ParetoMeasure {
    pub fn value(&self) -> f64 {
        match *self {
            ParetoMeasure::Count(count) => count as f64,
            ParetoMeasure::TotalHours(hours) => hours,
            ParetoMeasure::TotalCost(cost) => cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoItem {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub measure: ParetoMeasure,
    pub percentage: f64,
    pub cumulative_percentage: f64,
    pub is_vital_few: bool,
    /// Costs dimension only: labor hours left out of `totalCost` for lack of a rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpriced_labor_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoReport {
    pub dimension: ParetoDimension,
    pub data: Vec<ParetoItem>,
    pub total: f64,
    pub vital_few_count: usize,
    /// Labor hours excluded from cost totals because no rate applied; always
    /// zero outside the costs dimension
    pub unpriced_labor_hours: f64,
}

/// A grouping key with its display name and measure, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct ParetoGroup {
    pub id: String,
    pub name: String,
    pub measure: ParetoMeasure,
    pub unpriced_labor_hours: Option<f64>,
}

impl ParetoGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>, measure: ParetoMeasure) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            measure,
            unpriced_labor_hours: None,
        }
    }

    pub fn with_unpriced_labor_hours(mut self, hours: f64) -> Self {
        self.unpriced_labor_hours = Some(hours);
        self
    }
}

/// Group events in the window by the dimension and classify them
pub fn compute_pareto(
    dataset: &Dataset,
    window: &AnalysisWindow,
    filter: &AnalyticsFilter,
    dimension: ParetoDimension,
    settings: &CostSettings,
) -> AnalyticsResult<ParetoReport> {
    integrity::validate_dataset(dataset)?;
    let catalog = Catalog::new(dataset);
    let rates = LaborRateTable::new(&dataset.labor_rates, settings);

    let events = dataset
        .events
        .iter()
        .filter(|e| window.contains(e.started_at) && filter.matches_event(e, &catalog));

    let groups: Vec<ParetoGroup> = match dimension {
        ParetoDimension::Machines => {
            let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
            for event in events.filter(|e| e.is_breakdown()) {
                *counts.entry(event.asset_id.as_str()).or_insert(0) += 1;
            }
            counts
                .into_iter()
                .map(|(id, count)| ParetoGroup::new(id, catalog.asset_name(id), ParetoMeasure::Count(count)))
                .collect()
        }
        ParetoDimension::Causes => {
            let mut counts: BTreeMap<Option<&str>, u64> = BTreeMap::new();
            for event in events.filter(|e| e.is_breakdown()) {
                *counts.entry(event.cause_category_id.as_deref()).or_insert(0) += 1;
            }
            counts
                .into_iter()
                .map(|(id, count)| {
                    ParetoGroup::new(
                        id.unwrap_or(UNCATEGORIZED_KEY),
                        catalog.category_name(id),
                        ParetoMeasure::Count(count),
                    )
                })
                .collect()
        }
        ParetoDimension::Downtime => {
            let mut hours: BTreeMap<&str, f64> = BTreeMap::new();
            for event in events {
                *hours.entry(event.asset_id.as_str()).or_insert(0.0) += event.downtime_hours;
            }
            hours
                .into_iter()
                .map(|(id, total)| {
                    ParetoGroup::new(id, catalog.asset_name(id), ParetoMeasure::TotalHours(total))
                })
                .collect()
        }
        ParetoDimension::Costs => {
            // (priced cost, unpriced labor hours) per asset
            let mut costs: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
            for event in events {
                let entry = costs.entry(event.asset_id.as_str()).or_insert((0.0, 0.0));
                match rates.labor_cost(event) {
                    Some(labor) => entry.0 += labor,
                    None => entry.1 += event.labor_hours,
                }
                entry.0 += event.parts_cost + event.external_cost;
            }
            costs
                .into_iter()
                .map(|(id, (total, unpriced))| {
                    ParetoGroup::new(id, catalog.asset_name(id), ParetoMeasure::TotalCost(total))
                        .with_unpriced_labor_hours(unpriced)
                })
                .collect()
        }
    };

    let report = classify(dimension, groups);
    if report.unpriced_labor_hours > 0.0 {
        tracing::warn!(
            unpriced_hours = report.unpriced_labor_hours,
            "Labor hours without an applicable rate excluded from Pareto costs"
        );
    }
    tracing::debug!(
        dimension = %dimension,
        items = report.data.len(),
        vital_few = report.vital_few_count,
        "Computed Pareto"
    );
    Ok(report)
}

/// Sort groups by measure and flag the vital few
///
/// Ordering is descending by measure with ties broken by ascending id. The
/// vital few are the shortest prefix whose cumulative share reaches
/// [`VITAL_FEW_THRESHOLD`]; the item crossing the threshold is included.
/// Groups with a zero measure are dropped, and a zero total yields no data.
/// Unpriced labor hours are summed over every group, dropped ones included.
pub fn classify(dimension: ParetoDimension, groups: Vec<ParetoGroup>) -> ParetoReport {
    let unpriced_labor_hours: f64 = groups.iter().filter_map(|g| g.unpriced_labor_hours).sum();

    let mut groups: Vec<ParetoGroup> = groups
        .into_iter()
        .filter(|g| g.measure.value() > 0.0)
        .collect();

    let total: f64 = groups.iter().map(|g| g.measure.value()).sum();
    if total <= 0.0 {
        return ParetoReport {
            dimension,
            data: Vec::new(),
            total: 0.0,
            vital_few_count: 0,
            unpriced_labor_hours,
        };
    }

    groups.sort_by(|a, b| {
        b.measure
            .value()
            .partial_cmp(&a.measure.value())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut running = 0.0;
    let mut threshold_reached = false;
    let mut vital_few_count = 0;

    let data: Vec<ParetoItem> = groups
        .into_iter()
        .map(|group| {
            let value = group.measure.value();
            running += value;
            let cumulative_percentage = running * 100.0 / total;

            let is_vital_few = !threshold_reached;
            if is_vital_few {
                vital_few_count += 1;
                threshold_reached =
                    cumulative_percentage >= VITAL_FEW_THRESHOLD - CUMULATIVE_TOLERANCE;
            }

            ParetoItem {
                id: group.id,
                name: group.name,
                measure: group.measure,
                percentage: value * 100.0 / total,
                cumulative_percentage,
                is_vital_few,
                unpriced_labor_hours: group.unpriced_labor_hours,
            }
        })
        .collect();

    ParetoReport {
        dimension,
        data,
        total,
        vital_few_count,
        unpriced_labor_hours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CauseCategory, EventType, LaborRate, MaintenanceEvent, RateScope};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn counts(values: &[(&str, u64)]) -> Vec<ParetoGroup> {
        values
            .iter()
            .map(|(id, count)| ParetoGroup::new(*id, *id, ParetoMeasure::Count(*count)))
            .collect()
    }

    #[test]
    fn test_vital_few_boundary_exactly_at_threshold() {
        let report = classify(
            ParetoDimension::Causes,
            counts(&[("A", 50), ("B", 30), ("C", 15), ("D", 5)]),
        );

        let cumulative: Vec<f64> = report.data.iter().map(|i| i.cumulative_percentage).collect();
        assert_eq!(cumulative, vec![50.0, 80.0, 95.0, 100.0]);
        assert_eq!(report.vital_few_count, 2);
        assert!(report.data[1].is_vital_few);
        assert!(!report.data[2].is_vital_few);
    }

    #[test]
    fn test_vital_few_includes_item_crossing_threshold() {
        let report = classify(
            ParetoDimension::Causes,
            counts(&[("C4", 10), ("C2", 30), ("C1", 40), ("C3", 20)]),
        );

        let ids: Vec<&str> = report.data.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C2", "C3", "C4"]);

        let percentages: Vec<f64> = report.data.iter().map(|i| i.percentage).collect();
        assert_eq!(percentages, vec![40.0, 30.0, 20.0, 10.0]);

        let cumulative: Vec<f64> = report.data.iter().map(|i| i.cumulative_percentage).collect();
        assert_eq!(cumulative, vec![40.0, 70.0, 90.0, 100.0]);

        assert_eq!(report.vital_few_count, 3);
        assert_eq!(report.total, 100.0);
    }

    #[test]
    fn test_ties_broken_by_ascending_id() {
        let report = classify(
            ParetoDimension::Machines,
            counts(&[("M-3", 5), ("M-1", 5), ("M-2", 5)]),
        );
        let ids: Vec<&str> = report.data.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["M-1", "M-2", "M-3"]);
    }

    #[test]
    fn test_zero_total_yields_empty_data() {
        let report = classify(ParetoDimension::Downtime, counts(&[("M-1", 0), ("M-2", 0)]));
        assert!(report.data.is_empty());
        assert_eq!(report.total, 0.0);
        assert_eq!(report.vital_few_count, 0);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let report = classify(
            ParetoDimension::Machines,
            counts(&[("A", 7), ("B", 3), ("C", 3), ("D", 1), ("E", 1)]),
        );
        let sum: f64 = report.data.iter().map(|i| i.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert!((report.data.last().unwrap().cumulative_percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let groups = counts(&[("A", 7), ("B", 3), ("C", 3), ("D", 1)]);
        let first = classify(ParetoDimension::Machines, groups.clone());
        let second = classify(ParetoDimension::Machines, groups);
        assert_eq!(first, second);
    }

    #[test]
    fn test_measure_serializes_under_dimension_field() {
        let report = classify(
            ParetoDimension::Downtime,
            vec![ParetoGroup::new("M-1", "Press", ParetoMeasure::TotalHours(12.5))],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["data"][0]["totalHours"], 12.5);
        assert_eq!(json["data"][0]["isVitalFew"], true);
        assert_eq!(json["vitalFewCount"], 1);
        assert_eq!(json["dimension"], "downtime");
    }

    #[test]
    fn test_causes_group_uncategorized_into_one_bucket() {
        let at = |day| Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap();
        let dataset = Dataset::new()
            .with_categories(vec![CauseCategory::new("C1", "Bearing wear")])
            .with_events(vec![
                MaintenanceEvent::new("M-1", EventType::Breakdown, at(1)).with_cause("C1"),
                MaintenanceEvent::new("M-1", EventType::Breakdown, at(2)),
                MaintenanceEvent::new("M-2", EventType::Breakdown, at(3)),
                MaintenanceEvent::new("M-3", EventType::Breakdown, at(4)),
                MaintenanceEvent::new("M-3", EventType::Repair, at(5)),
            ]);

        let report = compute_pareto(
            &dataset,
            &AnalysisWindow::for_month(2024, 5).unwrap(),
            &AnalyticsFilter::new(),
            ParetoDimension::Causes,
            &CostSettings::default(),
        )
        .unwrap();

        assert_eq!(report.data.len(), 2);
        assert_eq!(report.data[0].id, UNCATEGORIZED_KEY);
        assert_eq!(report.data[0].measure, ParetoMeasure::Count(3));
        assert_eq!(report.data[1].name, "Bearing wear");
        assert_eq!(report.total, 4.0);
    }

    #[test]
    fn test_costs_surface_unpriced_labor_hours() {
        let at = |day| Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap();
        let dataset = Dataset::new()
            .with_labor_rates(vec![LaborRate::new(
                RateScope::Role("electrician".into()),
                40.0,
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            )])
            .with_events(vec![
                MaintenanceEvent::new("M-1", EventType::Repair, at(2))
                    .with_labor(40.0, 0.0)
                    .with_technician(None, Some("mechanic".into()))
                    .with_costs(150.0, 0.0),
                MaintenanceEvent::new("M-2", EventType::Repair, at(3))
                    .with_labor(5.0, 0.0)
                    .with_technician(None, Some("electrician".into()))
                    .with_costs(100.0, 0.0),
                MaintenanceEvent::new("M-3", EventType::Repair, at(4))
                    .with_labor(2.0, 0.0)
                    .with_technician(None, Some("painter".into())),
            ]);

        let report = compute_pareto(
            &dataset,
            &AnalysisWindow::for_month(2024, 5).unwrap(),
            &AnalyticsFilter::new(),
            ParetoDimension::Costs,
            &CostSettings::default(),
        )
        .unwrap();

        assert_eq!(report.data.len(), 2);
        assert_eq!(report.data[0].id, "M-2");
        assert_eq!(report.data[0].measure, ParetoMeasure::TotalCost(300.0));
        assert_eq!(report.data[0].unpriced_labor_hours, Some(0.0));
        assert_eq!(report.data[1].id, "M-1");
        assert_eq!(report.data[1].measure, ParetoMeasure::TotalCost(150.0));
        assert_eq!(report.data[1].unpriced_labor_hours, Some(40.0));
        // M-3 has no priced cost at all but its hours still count
        assert_eq!(report.unpriced_labor_hours, 42.0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["data"][1]["unpricedLaborHours"], 40.0);
        assert_eq!(json["unpricedLaborHours"], 42.0);
    }

    #[test]
    fn test_count_dimensions_report_no_unpriced_hours() {
        let report = classify(ParetoDimension::Machines, counts(&[("A", 2)]));
        assert_eq!(report.unpriced_labor_hours, 0.0);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["data"][0].get("unpricedLaborHours").is_none());
    }
}
