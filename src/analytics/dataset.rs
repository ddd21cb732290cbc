//! Input snapshot, analysis window and filters shared by every computation

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::models::{
    Asset, BudgetPeriod, CauseCategory, LaborRate, MaintenanceEvent, OperatingHoursEntry,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sort/group key of the synthetic bucket holding breakdowns without a cause
pub const UNCATEGORIZED_KEY: &str = "__uncategorized__";

/// Display name of the uncategorized bucket
pub const UNCATEGORIZED_NAME: &str = "Uncategorized";

/// Read-only snapshot of maintenance data handed to the calculations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub events: Vec<MaintenanceEvent>,
    pub assets: Vec<Asset>,
    pub categories: Vec<CauseCategory>,
    pub budgets: Vec<BudgetPeriod>,
    pub labor_rates: Vec<LaborRate>,
    pub operating_hours: Vec<OperatingHoursEntry>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(mut self, events: Vec<MaintenanceEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_assets(mut self, assets: Vec<Asset>) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_categories(mut self, categories: Vec<CauseCategory>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_budgets(mut self, budgets: Vec<BudgetPeriod>) -> Self {
        self.budgets = budgets;
        self
    }

    pub fn with_labor_rates(mut self, labor_rates: Vec<LaborRate>) -> Self {
        self.labor_rates = labor_rates;
        self
    }

    pub fn with_operating_hours(mut self, operating_hours: Vec<OperatingHoursEntry>) -> Self {
        self.operating_hours = operating_hours;
        self
    }

    /// Operating hours per asset for entries whose day falls in the window
    pub fn operating_hours_by_asset(&self, window: &AnalysisWindow) -> HashMap<&str, f64> {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for entry in self.operating_hours.iter().filter(|e| window.contains_date(e.date)) {
            *totals.entry(entry.asset_id.as_str()).or_insert(0.0) += entry.hours;
        }
        totals
    }

    /// Budget period for a (year, month), if one exists
    pub fn budget_for(&self, year: i32, month: u32) -> Option<&BudgetPeriod> {
        self.budgets.iter().find(|b| b.key() == (year, month))
    }
}

/// Lookup tables for display names and asset attributes
pub struct Catalog<'a> {
    assets: HashMap<&'a str, &'a Asset>,
    categories: HashMap<&'a str, &'a str>,
}

impl<'a> Catalog<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            assets: dataset.assets.iter().map(|a| (a.id.as_str(), a)).collect(),
            categories: dataset
                .categories
                .iter()
                .map(|c| (c.id.as_str(), c.name.as_str()))
                .collect(),
        }
    }

    pub fn asset(&self, asset_id: &str) -> Option<&'a Asset> {
        self.assets.get(asset_id).copied()
    }

    /// Asset display name, falling back to the identifier for unregistered assets
    pub fn asset_name(&self, asset_id: &str) -> String {
        self.asset(asset_id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| asset_id.to_string())
    }

    /// Category display name; `None` resolves to the uncategorized bucket
    pub fn category_name(&self, category_id: Option<&str>) -> String {
        match category_id {
            Some(id) => self
                .categories
                .get(id)
                .map(|name| name.to_string())
                .unwrap_or_else(|| id.to_string()),
            None => UNCATEGORIZED_NAME.to_string(),
        }
    }
}

/// Half-open analysis window `[start, end)` over event start timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> AnalyticsResult<Self> {
        if start >= end {
            return Err(AnalyticsError::InvalidDateRange(
                "Start date must be before end date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Window covering the `days` days up to `end`
    pub fn trailing_days(end: DateTime<Utc>, days: i64) -> AnalyticsResult<Self> {
        Self::new(end - Duration::days(days), end)
    }

    /// Window covering one calendar month
    pub fn for_month(year: i32, month: u32) -> AnalyticsResult<Self> {
        let start = month_start(year, month)?;
        let end = if month == 12 {
            month_start(year + 1, 1)?
        } else {
            month_start(year, month + 1)?
        };
        Self::new(start, end)
    }

    /// Window covering one calendar year
    pub fn for_year(year: i32) -> AnalyticsResult<Self> {
        Self::new(month_start(year, 1)?, month_start(year + 1, 1)?)
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// A day belongs to the window when it starts inside it, or the window
    /// starts part-way through that day
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        let day_start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        date >= self.start.date_naive() && day_start < self.end
    }

    /// Smallest window covering both windows
    pub fn union(&self, other: &AnalysisWindow) -> AnalysisWindow {
        AnalysisWindow {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn days(&self) -> f64 {
        self.end.signed_duration_since(self.start).num_seconds() as f64 / 86_400.0
    }
}

fn month_start(year: i32, month: u32) -> AnalyticsResult<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| AnalyticsError::InvalidDateRange(format!("Invalid month {}-{:02}", year, month)))
}

/// Year-month label (`YYYY-MM`) of a timestamp
pub fn period_label(timestamp: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", timestamp.year(), timestamp.month())
}

/// Optional asset / location / role narrowing applied to a computation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsFilter {
    /// Restrict to these assets; empty means all
    #[serde(default)]
    pub asset_ids: Vec<String>,

    /// Restrict to assets at this location
    pub location: Option<String>,

    /// Restrict to events worked by technicians holding this role
    pub role: Option<String>,
}

impl AnalyticsFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset_ids(mut self, asset_ids: Vec<String>) -> Self {
        self.asset_ids = asset_ids;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    fn matches_asset_id(&self, asset_id: &str) -> bool {
        self.asset_ids.is_empty() || self.asset_ids.iter().any(|id| id == asset_id)
    }

    /// Asset-level filters (ids and location)
    pub fn matches_asset(&self, asset: &Asset) -> bool {
        if !self.matches_asset_id(&asset.id) {
            return false;
        }
        match self.location {
            Some(ref location) => asset.location.as_deref() == Some(location.as_str()),
            None => true,
        }
    }

    /// Event-level filters; location resolves through the asset registry
    pub fn matches_event(&self, event: &MaintenanceEvent, catalog: &Catalog<'_>) -> bool {
        if !self.matches_asset_id(&event.asset_id) {
            return false;
        }

        if let Some(ref location) = self.location {
            let asset_location = catalog
                .asset(&event.asset_id)
                .and_then(|a| a.location.as_deref());
            if asset_location != Some(location.as_str()) {
                return false;
            }
        }

        if let Some(ref role) = self.role {
            if event.technician_role.as_deref() != Some(role.as_str()) {
                return false;
            }
        }

        true
    }
}
