//! Next-failure forecasts from historical breakdown intervals

use crate::analytics::dataset::{AnalyticsFilter, Catalog, Dataset};
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::integrity;
use crate::analytics::statistics::Distribution;
use crate::models::MaintenanceEvent;
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::Display;

/// Assets with fewer breakdowns than this are left out of the forecast
pub const MIN_BREAKDOWNS_FOR_PREDICTION: usize = 3;

/// Upper bounds (inclusive, in days until failure) for each severity band
pub const CRITICAL_DAYS: i64 = 7;
pub const HIGH_DAYS: i64 = 14;
pub const MEDIUM_DAYS: i64 = 30;

/// Gap count and coefficient-of-variation limits for each confidence band
pub const HIGH_CONFIDENCE_MIN_GAPS: usize = 5;
pub const HIGH_CONFIDENCE_MAX_CV: f64 = 0.25;
pub const MEDIUM_CONFIDENCE_MIN_GAPS: usize = 3;
pub const MEDIUM_CONFIDENCE_MAX_CV: f64 = 0.5;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FailureSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl FailureSeverity {
    /// Step function over days until the predicted failure; overdue
    /// predictions (negative days) are critical
    pub fn from_days_until_failure(days: i64) -> Self {
        if days <= CRITICAL_DAYS {
            FailureSeverity::Critical
        } else if days <= HIGH_DAYS {
            FailureSeverity::High
        } else if days <= MEDIUM_DAYS {
            FailureSeverity::Medium
        } else {
            FailureSeverity::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PredictionConfidence {
    High,
    Medium,
    Low,
}

impl PredictionConfidence {
    /// Classify from the interval sample: more gaps and less relative
    /// spread give higher confidence
    pub fn classify(gaps: &Distribution) -> Self {
        let cv = match gaps.coefficient_of_variation() {
            Some(cv) => cv,
            None => return PredictionConfidence::Low,
        };

        if gaps.count >= HIGH_CONFIDENCE_MIN_GAPS && cv <= HIGH_CONFIDENCE_MAX_CV {
            PredictionConfidence::High
        } else if gaps.count >= MEDIUM_CONFIDENCE_MIN_GAPS && cv <= MEDIUM_CONFIDENCE_MAX_CV {
            PredictionConfidence::Medium
        } else {
            PredictionConfidence::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePrediction {
    pub asset_id: String,
    pub asset_name: String,
    pub breakdown_count: usize,
    pub last_failure_date: DateTime<Utc>,
    pub average_days_between_failures: f64,
    /// Population standard deviation of the gaps
    pub standard_deviation_days: f64,
    pub predicted_failure_date: DateTime<Utc>,
    /// Whole days from now, rounded down; negative once overdue
    pub days_until_failure: i64,
    pub severity: FailureSeverity,
    pub confidence: PredictionConfidence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub total_predictions: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Assets left out for having too few breakdowns
    pub excluded_assets: usize,
}

/// Asset dropped from the batch because its own records are malformed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedAsset {
    pub asset_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub predictions: Vec<FailurePrediction>,
    pub summary: PredictionSummary,
    pub rejected: Vec<RejectedAsset>,
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Forecast the next breakdown of one asset
///
/// Non-breakdown events are ignored. Returns `Ok(None)` when the asset has
/// fewer than [`MIN_BREAKDOWNS_FOR_PREDICTION`] breakdowns.
pub fn predict_next_failure(
    asset_id: &str,
    asset_name: &str,
    events: &[&MaintenanceEvent],
    now: DateTime<Utc>,
) -> AnalyticsResult<Option<FailurePrediction>> {
    for event in events {
        integrity::validate_event(event)?;
    }

    let mut breakdowns: Vec<&MaintenanceEvent> =
        events.iter().copied().filter(|e| e.is_breakdown()).collect();
    if breakdowns.len() < MIN_BREAKDOWNS_FOR_PREDICTION {
        return Ok(None);
    }
    breakdowns.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));

    let gaps: Vec<f64> = breakdowns
        .windows(2)
        .map(|pair| days_between(pair[0].started_at, pair[1].started_at))
        .collect();

    let distribution = Distribution::from_data(&gaps).ok_or_else(|| {
        AnalyticsError::DataIntegrity(format!("No breakdown intervals for asset {}", asset_id))
    })?;

    let last_failure_date = breakdowns[breakdowns.len() - 1].started_at;
    let offset = Duration::milliseconds((distribution.mean * MILLIS_PER_DAY).round() as i64);
    let predicted_failure_date = last_failure_date + offset;
    let days_until_failure = days_between(now, predicted_failure_date).floor() as i64;

    Ok(Some(FailurePrediction {
        asset_id: asset_id.to_string(),
        asset_name: asset_name.to_string(),
        breakdown_count: breakdowns.len(),
        last_failure_date,
        average_days_between_failures: distribution.mean,
        standard_deviation_days: distribution.std_dev,
        predicted_failure_date,
        days_until_failure,
        severity: FailureSeverity::from_days_until_failure(days_until_failure),
        confidence: PredictionConfidence::classify(&distribution),
    }))
}

enum AssetOutcome {
    Predicted(FailurePrediction),
    Excluded,
    Rejected(RejectedAsset),
}

/// Forecast every asset with enough breakdown history up to `now`
///
/// An asset whose own events are malformed is reported under `rejected`
/// and the rest of the batch still completes. Malformed budgets or labor
/// rates fail the whole call.
pub fn predict_failures(
    dataset: &Dataset,
    filter: &AnalyticsFilter,
    now: DateTime<Utc>,
) -> AnalyticsResult<PredictionReport> {
    integrity::validate_budgets(&dataset.budgets)?;
    integrity::validate_labor_rates(&dataset.labor_rates)?;
    let catalog = Catalog::new(dataset);

    let mut by_asset: BTreeMap<&str, Vec<&MaintenanceEvent>> = BTreeMap::new();
    for event in dataset
        .events
        .iter()
        .filter(|e| e.is_breakdown() && e.started_at <= now && filter.matches_event(e, &catalog))
    {
        by_asset.entry(event.asset_id.as_str()).or_default().push(event);
    }

    let registered: BTreeSet<&str> = dataset
        .assets
        .iter()
        .filter(|a| filter.matches_asset(a))
        .map(|a| a.id.as_str())
        .collect();
    let without_history = registered
        .iter()
        .filter(|id| !by_asset.contains_key(*id))
        .count();

    let groups: Vec<(&str, Vec<&MaintenanceEvent>)> = by_asset.into_iter().collect();
    let outcomes: Vec<AssetOutcome> = groups
        .par_iter()
        .map(|(asset_id, events)| {
            let name = catalog.asset_name(asset_id);
            match predict_next_failure(asset_id, &name, events, now) {
                Ok(Some(prediction)) => AssetOutcome::Predicted(prediction),
                Ok(None) => AssetOutcome::Excluded,
                Err(e) => AssetOutcome::Rejected(RejectedAsset {
                    asset_id: asset_id.to_string(),
                    reason: e.to_string(),
                }),
            }
        })
        .collect();

    let mut predictions = Vec::new();
    let mut rejected = Vec::new();
    let mut excluded_assets = without_history;
    for outcome in outcomes {
        match outcome {
            AssetOutcome::Predicted(p) => predictions.push(p),
            AssetOutcome::Excluded => excluded_assets += 1,
            AssetOutcome::Rejected(r) => rejected.push(r),
        }
    }

    predictions.sort_by(|a, b| {
        a.days_until_failure
            .cmp(&b.days_until_failure)
            .then_with(|| a.asset_id.cmp(&b.asset_id))
    });

    for r in &rejected {
        tracing::warn!(asset_id = %r.asset_id, reason = %r.reason, "Asset rejected from failure prediction");
    }

    let count = |severity: FailureSeverity| predictions.iter().filter(|p| p.severity == severity).count();
    let summary = PredictionSummary {
        total_predictions: predictions.len(),
        critical: count(FailureSeverity::Critical),
        high: count(FailureSeverity::High),
        medium: count(FailureSeverity::Medium),
        low: count(FailureSeverity::Low),
        excluded_assets,
    };

    tracing::debug!(
        predictions = summary.total_predictions,
        excluded = summary.excluded_assets,
        rejected = rejected.len(),
        "Computed failure predictions"
    );

    Ok(PredictionReport {
        predictions,
        summary,
        rejected,
    })
}
