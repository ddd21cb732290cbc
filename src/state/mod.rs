pub mod factory;
pub mod sled_store;
pub mod store;

pub use factory::{create_in_memory_store, create_store};
pub use sled_store::SledStore;
pub use store::*;

use crate::analytics::Dataset;
use crate::error::Result;
use crate::models::{
    Asset, BudgetPeriod, CauseCategory, EventType, LaborRate, MaintenanceEvent,
    OperatingHoursEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Trait for maintenance data storage operations
#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    /// Save (insert or replace) a maintenance event
    async fn save_event(&self, event: &MaintenanceEvent) -> Result<()>;

    /// Get an event by ID
    async fn get_event(&self, id: &Uuid) -> Result<Option<MaintenanceEvent>>;

    /// List events matching the filter, oldest first
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<MaintenanceEvent>>;

    /// Save (insert or replace) an asset
    async fn save_asset(&self, asset: &Asset) -> Result<()>;

    async fn list_assets(&self) -> Result<Vec<Asset>>;

    async fn save_category(&self, category: &CauseCategory) -> Result<()>;

    async fn list_categories(&self) -> Result<Vec<CauseCategory>>;

    /// Save a budget period; a second budget for the same month is a conflict
    async fn save_budget(&self, budget: &BudgetPeriod) -> Result<()>;

    async fn list_budgets(&self) -> Result<Vec<BudgetPeriod>>;

    async fn save_labor_rate(&self, rate: &LaborRate) -> Result<()>;

    async fn list_labor_rates(&self) -> Result<Vec<LaborRate>>;

    /// Save operating hours; replaces an existing entry for the same asset and day
    async fn save_operating_hours(&self, entry: &OperatingHoursEntry) -> Result<()>;

    async fn list_operating_hours(&self) -> Result<Vec<OperatingHoursEntry>>;

    /// Load everything the analytics need, with events narrowed by `filter`
    async fn snapshot(&self, filter: &EventFilter) -> Result<Dataset> {
        Ok(Dataset {
            events: self.list_events(filter).await?,
            assets: self.list_assets().await?,
            categories: self.list_categories().await?,
            budgets: self.list_budgets().await?,
            labor_rates: self.list_labor_rates().await?,
            operating_hours: self.list_operating_hours().await?,
        })
    }
}

/// Filter for querying maintenance events
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub asset_ids: Vec<String>,
    /// Inclusive lower bound on `started_at`
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `started_at`
    pub end: Option<DateTime<Utc>>,
    pub category_id: Option<String>,
    pub event_types: Vec<EventType>,
}

impl EventFilter {
    pub fn matches(&self, event: &MaintenanceEvent) -> bool {
        let asset_match = self.asset_ids.is_empty() || self.asset_ids.contains(&event.asset_id);
        let start_match = self.start.map_or(true, |start| event.started_at >= start);
        let end_match = self.end.map_or(true, |end| event.started_at < end);
        let category_match = self.category_id.is_none()
            || self.category_id.as_deref() == event.cause_category_id.as_deref();
        let type_match = self.event_types.is_empty() || self.event_types.contains(&event.event_type);

        asset_match && start_match && end_match && category_match && type_match
    }
}

/// Key under which operating hours are unique
pub(crate) fn operating_hours_key(entry: &OperatingHoursEntry) -> String {
    format!("{}|{}", entry.asset_id, entry.date)
}

/// Key under which budget periods are unique
pub(crate) fn budget_key(budget: &BudgetPeriod) -> String {
    format!("{:04}-{:02}", budget.year, budget.month)
}
