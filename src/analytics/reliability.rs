//! MTBF and MTTR per asset

use crate::analytics::dataset::{AnalysisWindow, AnalyticsFilter, Catalog, Dataset};
use crate::analytics::error::AnalyticsResult;
use crate::analytics::integrity;
use crate::analytics::statistics::mean_of_present;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// MTBF row for one machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineMtbf {
    pub asset_id: String,
    pub asset_name: String,
    pub operating_hours: f64,
    pub failure_count: u64,
    /// `None` when the machine had no failures (or no recorded operating
    /// hours) in the window
    pub mtbf_hours: Option<f64>,
    pub mtbf_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtbfSummary {
    pub total_machines: usize,
    pub machines_with_failures: usize,
    pub total_failures: u64,
    pub total_operating_hours: f64,
    /// Mean over machines with a defined MTBF only
    pub average_mtbf_hours: Option<f64>,
    pub average_mtbf_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtbfReport {
    pub machines: Vec<MachineMtbf>,
    pub summary: MtbfSummary,
}

/// MTTR row for one machine; machines without completed repairs are omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineMttr {
    pub asset_id: String,
    pub asset_name: String,
    pub repair_count: u64,
    pub total_repair_hours: f64,
    pub mttr_minutes: f64,
    pub mttr_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MttrSummary {
    pub total_repairs: u64,
    pub machines_with_repairs: usize,
    pub average_mttr_minutes: Option<f64>,
    pub average_mttr_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MttrReport {
    pub machines: Vec<MachineMttr>,
    pub summary: MttrSummary,
}

/// Mean time between failures: operating hours over breakdown count
///
/// Every registered asset passing the filter is listed, plus unregistered
/// assets that broke down in the window.
pub fn compute_mtbf(
    dataset: &Dataset,
    window: &AnalysisWindow,
    filter: &AnalyticsFilter,
) -> AnalyticsResult<MtbfReport> {
    integrity::validate_dataset(dataset)?;
    let catalog = Catalog::new(dataset);

    let mut failures: BTreeMap<&str, u64> = BTreeMap::new();
    for asset in dataset.assets.iter().filter(|a| filter.matches_asset(a)) {
        failures.entry(asset.id.as_str()).or_insert(0);
    }
    for event in dataset.events.iter().filter(|e| {
        e.is_breakdown() && window.contains(e.started_at) && filter.matches_event(e, &catalog)
    }) {
        *failures.entry(event.asset_id.as_str()).or_insert(0) += 1;
    }

    let operating_hours = dataset.operating_hours_by_asset(window);

    let machines: Vec<MachineMtbf> = failures
        .into_iter()
        .map(|(asset_id, failure_count)| {
            let hours = operating_hours.get(asset_id).copied().unwrap_or(0.0);
            let mtbf_hours = if failure_count > 0 && hours > 0.0 {
                Some(hours / failure_count as f64)
            } else {
                None
            };
            MachineMtbf {
                asset_id: asset_id.to_string(),
                asset_name: catalog.asset_name(asset_id),
                operating_hours: hours,
                failure_count,
                mtbf_hours,
                mtbf_days: mtbf_hours.map(|h| h / 24.0),
            }
        })
        .collect();

    let average_mtbf_hours = mean_of_present(machines.iter().map(|m| m.mtbf_hours));
    let summary = MtbfSummary {
        total_machines: machines.len(),
        machines_with_failures: machines.iter().filter(|m| m.failure_count > 0).count(),
        total_failures: machines.iter().map(|m| m.failure_count).sum(),
        total_operating_hours: machines.iter().map(|m| m.operating_hours).sum(),
        average_mtbf_hours,
        average_mtbf_days: average_mtbf_hours.map(|h| h / 24.0),
    };

    tracing::debug!(
        machines = summary.total_machines,
        failures = summary.total_failures,
        "Computed MTBF"
    );

    Ok(MtbfReport { machines, summary })
}

/// Mean time to repair over completed corrective work (breakdowns and repairs)
pub fn compute_mttr(
    dataset: &Dataset,
    window: &AnalysisWindow,
    filter: &AnalyticsFilter,
) -> AnalyticsResult<MttrReport> {
    integrity::validate_dataset(dataset)?;
    let catalog = Catalog::new(dataset);

    let mut repairs: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    for event in dataset.events.iter().filter(|e| {
        e.is_corrective() && window.contains(e.started_at) && filter.matches_event(e, &catalog)
    }) {
        if let Some(hours) = event.repair_hours() {
            let entry = repairs.entry(event.asset_id.as_str()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += hours;
        }
    }

    let machines: Vec<MachineMttr> = repairs
        .into_iter()
        .map(|(asset_id, (repair_count, total_repair_hours))| {
            let mttr_hours = total_repair_hours / repair_count as f64;
            MachineMttr {
                asset_id: asset_id.to_string(),
                asset_name: catalog.asset_name(asset_id),
                repair_count,
                total_repair_hours,
                mttr_minutes: mttr_hours * 60.0,
                mttr_hours,
            }
        })
        .collect();

    let average_mttr_minutes = mean_of_present(machines.iter().map(|m| Some(m.mttr_minutes)));
    let summary = MttrSummary {
        total_repairs: machines.iter().map(|m| m.repair_count).sum(),
        machines_with_repairs: machines.len(),
        average_mttr_minutes,
        average_mttr_hours: average_mttr_minutes.map(|m| m / 60.0),
    };

    tracing::debug!(
        machines = summary.machines_with_repairs,
        repairs = summary.total_repairs,
        "Computed MTTR"
    );

    Ok(MttrReport { machines, summary })
}
