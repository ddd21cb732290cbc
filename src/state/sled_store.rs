use crate::error::{AppError, Result};
use crate::models::{
    Asset, BudgetPeriod, CauseCategory, LaborRate, MaintenanceEvent, OperatingHoursEntry,
};
use crate::state::{budget_key, operating_hours_key, EventFilter, MaintenanceStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Persistent maintenance store using Sled embedded database
///
/// One tree per record kind, values encoded with bincode.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    events_tree: sled::Tree,
    assets_tree: sled::Tree,
    categories_tree: sled::Tree,
    budgets_tree: sled::Tree,
    labor_rates_tree: sled::Tree,
    operating_hours_tree: sled::Tree,
}

impl SledStore {
    /// Open (or create) the database at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path)
            .map_err(|e| AppError::Storage(format!("Cannot open {}: {}", path.display(), e)))?;

        let store = Self {
            events_tree: db.open_tree("events")?,
            assets_tree: db.open_tree("assets")?,
            categories_tree: db.open_tree("categories")?,
            budgets_tree: db.open_tree("budgets")?,
            labor_rates_tree: db.open_tree("labor_rates")?,
            operating_hours_tree: db.open_tree("operating_hours")?,
            db: Arc::new(db),
        };

        tracing::info!(path = ?path, "Opened sled maintenance store");
        Ok(store)
    }

    fn put<T: Serialize>(tree: &sled::Tree, key: &[u8], value: &T) -> Result<()> {
        tree.insert(key, bincode::serialize(value)?)?;
        tree.flush()?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>> {
        tree.iter()
            .values()
            .map(|item| -> Result<T> {
                let bytes = item?;
                Ok(bincode::deserialize(&bytes)?)
            })
            .collect()
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

#[async_trait]
impl MaintenanceStore for SledStore {
    async fn save_event(&self, event: &MaintenanceEvent) -> Result<()> {
        Self::put(&self.events_tree, event.id.as_bytes(), event)?;
        tracing::debug!(event_id = %event.id, "Event saved to Sled");
        Ok(())
    }

    async fn get_event(&self, id: &Uuid) -> Result<Option<MaintenanceEvent>> {
        self.events_tree
            .get(id.as_bytes())?
            .map(|bytes| bincode::deserialize::<MaintenanceEvent>(&bytes).map_err(AppError::from))
            .transpose()
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<MaintenanceEvent>> {
        let mut events: Vec<MaintenanceEvent> = Self::scan::<MaintenanceEvent>(&self.events_tree)?
            .into_iter()
            .filter(|event| filter.matches(event))
            .collect();

        events.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn save_asset(&self, asset: &Asset) -> Result<()> {
        Self::put(&self.assets_tree, asset.id.as_bytes(), asset)
    }

    async fn list_assets(&self) -> Result<Vec<Asset>> {
        let mut assets: Vec<Asset> = Self::scan(&self.assets_tree)?;
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assets)
    }

    async fn save_category(&self, category: &CauseCategory) -> Result<()> {
        Self::put(&self.categories_tree, category.id.as_bytes(), category)
    }

    async fn list_categories(&self) -> Result<Vec<CauseCategory>> {
        let mut categories: Vec<CauseCategory> = Self::scan(&self.categories_tree)?;
        categories.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(categories)
    }

    async fn save_budget(&self, budget: &BudgetPeriod) -> Result<()> {
        let key = budget_key(budget);
        let value = bincode::serialize(budget)?;

        // Insert only if absent, so concurrent writers cannot both succeed
        let swapped = self.budgets_tree.compare_and_swap(
            key.as_bytes(),
            None as Option<&[u8]>,
            Some(value),
        )?;
        if swapped.is_err() {
            return Err(AppError::Conflict(format!("Budget for {} already exists", key)));
        }

        self.budgets_tree.flush()?;
        Ok(())
    }

    async fn list_budgets(&self) -> Result<Vec<BudgetPeriod>> {
        // Zero-padded keys keep the tree in (year, month) order
        Self::scan(&self.budgets_tree)
    }

    async fn save_labor_rate(&self, rate: &LaborRate) -> Result<()> {
        Self::put(&self.labor_rates_tree, rate.id.as_bytes(), rate)
    }

    async fn list_labor_rates(&self) -> Result<Vec<LaborRate>> {
        let mut rates: Vec<LaborRate> = Self::scan(&self.labor_rates_tree)?;
        rates.sort_by(|a, b| a.effective_from.cmp(&b.effective_from).then(a.id.cmp(&b.id)));
        Ok(rates)
    }

    async fn save_operating_hours(&self, entry: &OperatingHoursEntry) -> Result<()> {
        Self::put(
            &self.operating_hours_tree,
            operating_hours_key(entry).as_bytes(),
            entry,
        )
    }

    async fn list_operating_hours(&self) -> Result<Vec<OperatingHoursEntry>> {
        // Key order is not (asset, date) order once one asset id prefixes another
        let mut entries: Vec<OperatingHoursEntry> = Self::scan(&self.operating_hours_tree)?;
        entries.sort_by(|a, b| a.asset_id.cmp(&b.asset_id).then(a.date.cmp(&b.date)));
        Ok(entries)
    }
}
