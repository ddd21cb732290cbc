use crate::error::{AppError, Result};
use crate::models::{
    Asset, BudgetPeriod, CauseCategory, LaborRate, MaintenanceEvent, OperatingHoursEntry,
};
use crate::state::{budget_key, operating_hours_key, EventFilter, MaintenanceStore};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory maintenance store (for development and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    events: Arc<DashMap<Uuid, MaintenanceEvent>>,
    assets: Arc<DashMap<String, Asset>>,
    categories: Arc<DashMap<String, CauseCategory>>,
    budgets: Arc<DashMap<String, BudgetPeriod>>,
    labor_rates: Arc<DashMap<Uuid, LaborRate>>,
    operating_hours: Arc<DashMap<String, OperatingHoursEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            events: Arc::new(DashMap::new()),
            assets: Arc::new(DashMap::new()),
            categories: Arc::new(DashMap::new()),
            budgets: Arc::new(DashMap::new()),
            labor_rates: Arc::new(DashMap::new()),
            operating_hours: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn values<K, V>(map: &DashMap<K, V>) -> Vec<V>
where
    K: Eq + std::hash::Hash,
    V: Clone,
{
    map.iter().map(|entry| entry.value().clone()).collect()
}

#[async_trait]
impl MaintenanceStore for InMemoryStore {
    async fn save_event(&self, event: &MaintenanceEvent) -> Result<()> {
        self.events.insert(event.id, event.clone());
        tracing::debug!(event_id = %event.id, asset_id = %event.asset_id, "Event saved");
        Ok(())
    }

    async fn get_event(&self, id: &Uuid) -> Result<Option<MaintenanceEvent>> {
        Ok(self.events.get(id).map(|entry| entry.clone()))
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<MaintenanceEvent>> {
        let mut events: Vec<MaintenanceEvent> = self
            .events
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        events.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn save_asset(&self, asset: &Asset) -> Result<()> {
        self.assets.insert(asset.id.clone(), asset.clone());
        Ok(())
    }

    async fn list_assets(&self) -> Result<Vec<Asset>> {
        let mut assets = values(&self.assets);
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assets)
    }

    async fn save_category(&self, category: &CauseCategory) -> Result<()> {
        self.categories.insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<CauseCategory>> {
        let mut categories = values(&self.categories);
        categories.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(categories)
    }

    async fn save_budget(&self, budget: &BudgetPeriod) -> Result<()> {
        match self.budgets.entry(budget_key(budget)) {
            Entry::Occupied(entry) => Err(AppError::Conflict(format!(
                "Budget for {} already exists",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                entry.insert(budget.clone());
                Ok(())
            }
        }
    }

    async fn list_budgets(&self) -> Result<Vec<BudgetPeriod>> {
        let mut budgets = values(&self.budgets);
        budgets.sort_by_key(|b| b.key());
        Ok(budgets)
    }

    async fn save_labor_rate(&self, rate: &LaborRate) -> Result<()> {
        self.labor_rates.insert(rate.id, rate.clone());
        Ok(())
    }

    async fn list_labor_rates(&self) -> Result<Vec<LaborRate>> {
        let mut rates = values(&self.labor_rates);
        rates.sort_by(|a, b| a.effective_from.cmp(&b.effective_from).then(a.id.cmp(&b.id)));
        Ok(rates)
    }

    async fn save_operating_hours(&self, entry: &OperatingHoursEntry) -> Result<()> {
        self.operating_hours
            .insert(operating_hours_key(entry), entry.clone());
        Ok(())
    }

    async fn list_operating_hours(&self) -> Result<Vec<OperatingHoursEntry>> {
        let mut entries = values(&self.operating_hours);
        entries.sort_by(|a, b| a.asset_id.cmp(&b.asset_id).then(a.date.cmp(&b.date)));
        Ok(entries)
    }
}
